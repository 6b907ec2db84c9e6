//! Decides which plugin format a directory entry represents.
//!
//! Most formats are recognised by suffix alone. Waves ships every format as a
//! generic `.bundle`, so those entries are classified by looking inside:
//! marker executables first, then the bundle identifier, then the path itself.

use crate::manifest::InfoPlist;
use crate::plugin::PluginFormat;
use std::path::Path;
use tracing::debug;

/// Format assumed for a vendor bundle when nothing inside it says otherwise.
///
/// VST is the format Waves installs most often. This is a policy choice: an
/// unidentifiable bundle is still listed rather than dropped.
pub const VENDOR_BUNDLE_DEFAULT: PluginFormat = PluginFormat::Vst;

/// Packaging convention, derived from an entry's suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Packaging {
    /// `.component`
    Component,
    /// `.vst` (VST2 bundle)
    Vst,
    /// `.vst3`
    Vst3,
    /// `.dll` (Windows VST2)
    Dll,
    /// `.aaxplugin`
    AaxPlugin,
    /// `.aax` (Windows AAX)
    Aax,
    /// `.bundle` (vendor-specific, format decided by contents)
    Bundle,
}

impl Packaging {
    /// Recognises the packaging from an entry name. Unknown suffixes yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "component" => Some(Packaging::Component),
            "vst" => Some(Packaging::Vst),
            "vst3" => Some(Packaging::Vst3),
            "dll" => Some(Packaging::Dll),
            "aaxplugin" => Some(Packaging::AaxPlugin),
            "aax" => Some(Packaging::Aax),
            "bundle" => Some(Packaging::Bundle),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(Packaging::from_name)
    }

    /// Format implied by the suffix alone; `None` for vendor bundles.
    pub fn format(self) -> Option<PluginFormat> {
        match self {
            Packaging::Component => Some(PluginFormat::AudioUnit),
            Packaging::Vst | Packaging::Vst3 | Packaging::Dll => Some(PluginFormat::Vst),
            Packaging::AaxPlugin | Packaging::Aax => Some(PluginFormat::Aax),
            Packaging::Bundle => None,
        }
    }

    /// Whether entries with this packaging must be directories. Windows ships
    /// `.dll` and `.aax` as files, and `.vst3` as either.
    pub fn is_bundle_only(self) -> bool {
        matches!(
            self,
            Packaging::Component | Packaging::Vst | Packaging::AaxPlugin | Packaging::Bundle
        )
    }

    /// `name` without this packaging's suffix.
    pub fn strip_suffix(self, name: &str) -> &str {
        match name.rsplit_once('.') {
            Some((stem, _)) if Packaging::from_name(name) == Some(self) => stem,
            _ => name,
        }
    }
}

/// Marker executables inside a vendor bundle, checked in order.
const BUNDLE_MARKERS: &[(&str, PluginFormat)] = &[
    ("Contents/MacOS/VST", PluginFormat::Vst),
    ("Contents/MacOS/VST3", PluginFormat::Vst),
    ("Contents/MacOS/AU", PluginFormat::AudioUnit),
    ("Contents/MacOS/AAX", PluginFormat::Aax),
];

/// Classifies one directory entry, or rejects it with `None`.
pub fn classify(entry_name: &str, entry_path: &Path) -> Option<PluginFormat> {
    let packaging = Packaging::from_name(entry_name)?;
    match packaging.format() {
        Some(format) => Some(format),
        None => Some(classify_vendor_bundle(entry_path)),
    }
}

/// Works out the format of a `.bundle`. Never rejects.
pub fn classify_vendor_bundle(bundle: &Path) -> PluginFormat {
    if let Some(format) = format_from_markers(bundle) {
        return format;
    }

    if let Some(format) = InfoPlist::load(bundle)
        .as_ref()
        .and_then(InfoPlist::bundle_identifier)
        .and_then(format_from_text)
    {
        return format;
    }

    if let Some(format) = format_from_text(&bundle.to_string_lossy()) {
        return format;
    }

    debug!(
        path = %bundle.display(),
        format = %VENDOR_BUNDLE_DEFAULT,
        "No format indicators in bundle, using default"
    );
    VENDOR_BUNDLE_DEFAULT
}

fn format_from_markers(bundle: &Path) -> Option<PluginFormat> {
    BUNDLE_MARKERS
        .iter()
        .find(|(marker, _)| bundle.join(marker).exists())
        .map(|(_, format)| *format)
}

/// Looks for format names in an identifier or path.
///
/// `vst`, `audiounit` and `aax` match anywhere, so `WavesAAX` counts. The
/// short `au` only matches as a whole word; as a substring it would hit
/// `Audio` in plugin roots and names such as `paul`.
fn format_from_text(text: &str) -> Option<PluginFormat> {
    let lower = text.to_lowercase();

    if lower.contains("vst") {
        return Some(PluginFormat::Vst);
    }
    let au_word = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|t| matches!(t, "au" | "audiounits" | "component" | "components"));
    if au_word || lower.contains("audiounit") {
        return Some(PluginFormat::AudioUnit);
    }
    if lower.contains("aax") {
        return Some(PluginFormat::Aax);
    }
    None
}
