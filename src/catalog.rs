//! Known plugin installation directories.
//!
//! The catalog is pure data: an ordered list of roots, each tagged with the
//! plugin family it is expected to hold. Roots that do not exist, or that
//! appear twice, are tolerated by the scanner.
//!
//! # Platform-Specific Behavior
//!
//! ## macOS
//! - Plugins are bundles (directories with extensions like .vst, .vst3, .component, .aaxplugin)
//! - Scans both system `/Library` and user `~/Library` locations
//! - Waves ships `.bundle` plugins under versioned `Plug-Ins Vnn` folders
//!
//! ## Windows
//! - VST2 plugins are DLL files, VST3 and AAX are bundles under Common Files
//! - No AU support (macOS-only format)
//!
//! ## Linux
//! - VST2 and VST3 under `~/.vst*`, `/usr/lib` and `/usr/local/lib`

use crate::classify::Packaging;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The group of roots a directory belongs to. Scan order follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    AudioUnit,
    Vst,
    Aax,
    /// Waves keeps all formats as `.bundle` directories, classified by content.
    Waves,
}

impl Family {
    /// Whether an entry with this packaging belongs in a root of this family.
    pub fn admits(self, packaging: Packaging) -> bool {
        match self {
            Family::AudioUnit => matches!(packaging, Packaging::Component),
            Family::Vst => matches!(packaging, Packaging::Vst | Packaging::Vst3 | Packaging::Dll),
            Family::Aax => matches!(packaging, Packaging::AaxPlugin | Packaging::Aax),
            Family::Waves => matches!(packaging, Packaging::Bundle),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Family::AudioUnit => "au",
            Family::Vst => "vst",
            Family::Aax => "aax",
            Family::Waves => "waves",
        }
    }
}

/// A single directory to list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRoot {
    pub family: Family,
    pub path: PathBuf,
}

/// Ordered list of roots to scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    roots: Vec<CatalogRoot>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the root after the last root of its family (or of an earlier
    /// family), so the list stays grouped by family.
    pub fn with_root(mut self, family: Family, path: impl Into<PathBuf>) -> Self {
        self.push(family, path);
        self
    }

    pub fn push(&mut self, family: Family, path: impl Into<PathBuf>) {
        let root = CatalogRoot { family, path: path.into() };
        let at = self
            .roots
            .iter()
            .rposition(|r| family_rank(r.family) <= family_rank(family))
            .map_or(0, |i| i + 1);
        self.roots.insert(at, root);
    }

    pub fn roots(&self) -> &[CatalogRoot] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Drops every root that lives under `home`.
    pub fn without_roots_under(mut self, home: &Path) -> Self {
        self.roots.retain(|r| !r.path.starts_with(home));
        self
    }

    /// The reference macOS layout.
    pub fn macos(home: &Path) -> Self {
        let user = |rel: &str| home.join(rel);
        let mut catalog = Catalog::new();

        // Audio Units (AU) - macOS native format
        catalog.push(Family::AudioUnit, "/Library/Audio/Plug-Ins/Components");
        catalog.push(Family::AudioUnit, user("Library/Audio/Plug-Ins/Components"));

        // VST2 and VST3 share one family
        catalog.push(Family::Vst, "/Library/Audio/Plug-Ins/VST");
        catalog.push(Family::Vst, "/Library/Audio/Plug-Ins/VST3");
        catalog.push(Family::Vst, user("Library/Audio/Plug-Ins/VST"));
        catalog.push(Family::Vst, user("Library/Audio/Plug-Ins/VST3"));

        // AAX - Avid Pro Tools format
        catalog.push(Family::Aax, "/Library/Application Support/Avid/Audio/Plug-Ins");
        catalog.push(Family::Aax, user("Library/Application Support/Avid/Audio/Plug-Ins"));

        // Waves bundles sit directly inside these folders
        for major in 9..=14 {
            catalog.push(Family::Waves, format!("/Applications/Waves/Plug-Ins V{major}/Waves"));
        }
        catalog.push(Family::Waves, "/Applications/Waves/Plug-Ins V15");
        catalog.push(Family::Waves, "/Applications/Waves/Plug-Ins/Waves");
        catalog.push(Family::Waves, "/Library/Application Support/Waves/Plug-Ins");
        catalog.push(Family::Waves, user("Library/Application Support/Waves/Plug-Ins"));

        catalog
    }

    pub fn windows() -> Self {
        let mut catalog = Catalog::new();

        // VST2 - Legacy Steinberg format (common locations on Windows)
        catalog.push(Family::Vst, r"C:\Program Files\VSTPlugins");
        catalog.push(Family::Vst, r"C:\Program Files\Steinberg\VSTPlugins");
        catalog.push(Family::Vst, r"C:\Program Files\Common Files\VST2");
        catalog.push(Family::Vst, r"C:\Program Files (x86)\VSTPlugins");
        catalog.push(Family::Vst, r"C:\Program Files (x86)\Steinberg\VSTPlugins");

        // VST3 - Modern Steinberg format
        catalog.push(Family::Vst, r"C:\Program Files\Common Files\VST3");

        // AAX - Avid Pro Tools format
        catalog.push(Family::Aax, r"C:\Program Files\Common Files\Avid\Audio\Plug-Ins");
        catalog.push(Family::Aax, r"C:\Program Files (x86)\Common Files\Avid\Audio\Plug-Ins");

        catalog
    }

    pub fn linux(home: &Path) -> Self {
        let mut catalog = Catalog::new();
        catalog.push(Family::Vst, home.join(".vst"));
        catalog.push(Family::Vst, "/usr/lib/vst");
        catalog.push(Family::Vst, "/usr/local/lib/vst");
        catalog.push(Family::Vst, home.join(".vst3"));
        catalog.push(Family::Vst, "/usr/lib/vst3");
        catalog.push(Family::Vst, "/usr/local/lib/vst3");
        catalog
    }

    /// The table for the platform this crate was built for.
    pub fn system_default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));

        #[cfg(target_os = "macos")]
        {
            Catalog::macos(&home)
        }

        #[cfg(target_os = "windows")]
        {
            let _ = home;
            Catalog::windows()
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            Catalog::linux(&home)
        }
    }
}

fn family_rank(family: Family) -> u8 {
    match family {
        Family::AudioUnit => 0,
        Family::Vst => 1,
        Family::Aax => 2,
        Family::Waves => 3,
    }
}
