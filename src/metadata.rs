//! Version and manufacturer extraction.
//!
//! Each field is resolved by an ordered list of strategies. A strategy looks at
//! one source of evidence (a manifest key, a file name, a directory name) and
//! either produces a value or passes. The first value wins; when every
//! strategy passes the field is left unknown.
//!
//! ## Version strategies
//!
//! | Order | Strategy           | Source                                             |
//! |-------|--------------------|----------------------------------------------------|
//! | 1     | `vendor-directory` | `Plug-Ins V14` style folder above a Waves bundle   |
//! | 2     | `manifest`         | `moduleinfo.json`, then `Info.plist` version keys  |
//! | 3     | `resource-file`    | `Version:` line in a VST2 `plugin.info`            |
//! | 4     | `file-name`        | `V9.2` (Waves) or `1.2.3` in the entry name        |
//!
//! ## Manufacturer strategies
//!
//! | Order | Strategy             | Source                                         |
//! |-------|----------------------|------------------------------------------------|
//! | 1     | `vendor-convention`  | entry lives in a Waves folder                  |
//! | 2     | `manifest`           | vendor keys in `moduleinfo.json` / `Info.plist`|
//! | 3     | `bundle-identifier`  | `com.vendor.Product`                           |
//! | 4     | `copyright`          | `© 2022 Vendor GmbH`                           |
//! | 5     | `file-name`          | `Vendor Product.vst`                           |
//! | 6     | `parent-directory`   | folder holding the entry, unless generic       |

use crate::classify::Packaging;
use crate::manifest::{read_resource_info, InfoPlist, ModuleInfo};
use crate::patterns;
use crate::plugin::Detected;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Vendor whose folder names carry the product version.
pub const WAVES: &str = "Waves";

/// Folder names that describe a format or location rather than a vendor.
const GENERIC_FOLDERS: &[&str] = &[
    "Components",
    "VST",
    "VST3",
    "Plug-Ins",
    "Audio",
    "Library",
    "Plugins",
];

const VERSION_KEYS: &[&str] = &["CFBundleShortVersionString", "CFBundleVersion"];
const VENDOR_KEYS: &[&str] = &["AudioUnitVendorName", "AAXManufacturerName"];

type Strategy = fn(&Probe) -> Option<String>;

const VERSION_STRATEGIES: &[(&str, Strategy)] = &[
    ("vendor-directory", version_from_vendor_directory),
    ("manifest", version_from_manifest),
    ("resource-file", version_from_resource_file),
    ("file-name", version_from_file_name),
];

const MANUFACTURER_STRATEGIES: &[(&str, Strategy)] = &[
    ("vendor-convention", manufacturer_from_vendor_convention),
    ("manifest", manufacturer_from_manifest),
    ("bundle-identifier", manufacturer_from_bundle_identifier),
    ("copyright", manufacturer_from_copyright),
    ("file-name", manufacturer_from_file_name),
    ("parent-directory", manufacturer_from_parent_directory),
];

/// Everything the strategies may consult about one entry, gathered once.
#[derive(Debug)]
pub struct Probe {
    path: PathBuf,
    packaging: Option<Packaging>,
    vendor_layout: bool,
    info: Option<InfoPlist>,
    module_info: Option<ModuleInfo>,
}

impl Probe {
    pub fn open(path: &Path) -> Self {
        let packaging = Packaging::from_path(path);
        let is_bundle = path.is_dir();
        Probe {
            path: path.to_path_buf(),
            packaging,
            vendor_layout: is_vendor_path(path),
            info: if is_bundle { InfoPlist::load(path) } else { None },
            module_info: match packaging {
                Some(Packaging::Vst3) if is_bundle => ModuleInfo::load(path),
                _ => None,
            },
        }
    }

    pub fn version(&self) -> Detected {
        self.resolve("version", VERSION_STRATEGIES)
    }

    pub fn manufacturer(&self) -> Detected {
        self.resolve("manufacturer", MANUFACTURER_STRATEGIES)
    }

    /// Entry name with the packaging suffix and vendor prefix removed.
    pub fn display_name(&self) -> String {
        let raw = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        clean_name(&raw, self.packaging, self.vendor_layout)
    }

    fn resolve(&self, field: &str, strategies: &[(&str, Strategy)]) -> Detected {
        for (name, strategy) in strategies {
            let found = Detected::from(strategy(self));
            if found.is_known() {
                debug!(
                    path = %self.path.display(),
                    field,
                    strategy = name,
                    value = found.as_str(),
                    "Resolved metadata"
                );
                return found;
            }
        }
        Detected::unknown()
    }

    fn stem(&self) -> Option<&str> {
        let name = self.path.file_name()?.to_str()?;
        Some(match self.packaging {
            Some(packaging) => packaging.strip_suffix(name),
            None => name,
        })
    }
}

/// Best-effort version of the plugin at `path`, or `"Unknown"`.
pub fn extract_version(path: &Path) -> String {
    Probe::open(path).version().as_str().to_string()
}

/// Best-effort manufacturer of the plugin at `path`, or `"Unknown"`.
pub fn extract_manufacturer(path: &Path) -> String {
    Probe::open(path).manufacturer().as_str().to_string()
}

/// Whether `path` follows the Waves layout: a `Waves` folder above the entry,
/// or a bundle named `Waves <Product>.bundle`.
pub fn is_vendor_path(path: &Path) -> bool {
    let in_vendor_folder = path
        .parent()
        .map(|parent| {
            parent
                .components()
                .any(|c| matches!(c, Component::Normal(part) if part == WAVES))
        })
        .unwrap_or(false);
    if in_vendor_folder {
        return true;
    }
    let leaf = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    leaf.starts_with("Waves ") && Packaging::from_name(leaf) == Some(Packaging::Bundle)
}

/// Strips the packaging suffix and, for Waves entries, the leading `Waves `.
pub fn clean_name(raw: &str, packaging: Option<Packaging>, vendor_layout: bool) -> String {
    let name = match packaging {
        Some(p) => p.strip_suffix(raw),
        None => raw,
    };
    let name = if vendor_layout {
        name.strip_prefix("Waves ").unwrap_or(name)
    } else {
        name
    };
    name.trim().to_string()
}

// ---- version strategies ----

fn version_from_vendor_directory(probe: &Probe) -> Option<String> {
    if !probe.vendor_layout {
        return None;
    }
    probe
        .path
        .ancestors()
        .skip(1)
        .filter_map(|dir| dir.file_name().and_then(|n| n.to_str()))
        .find_map(patterns::directory_version)
}

fn version_from_manifest(probe: &Probe) -> Option<String> {
    probe
        .module_info
        .as_ref()
        .and_then(ModuleInfo::version)
        .or_else(|| {
            let info = probe.info.as_ref()?;
            info.first_string(VERSION_KEYS)
                .or_else(|| info.audio_unit_version())
        })
}

fn version_from_resource_file(probe: &Probe) -> Option<String> {
    if probe.packaging != Some(Packaging::Vst) {
        return None;
    }
    read_resource_info(&probe.path).and_then(|text| patterns::resource_version(&text))
}

fn version_from_file_name(probe: &Probe) -> Option<String> {
    let stem = probe.stem()?;
    if probe.vendor_layout {
        if let Some(v) = patterns::vendor_leaf_version(stem) {
            return Some(v);
        }
    }
    patterns::numeric_version(stem)
}

// ---- manufacturer strategies ----

fn manufacturer_from_vendor_convention(probe: &Probe) -> Option<String> {
    probe.vendor_layout.then(|| WAVES.to_string())
}

fn manufacturer_from_manifest(probe: &Probe) -> Option<String> {
    if let Some(vendor) = probe.module_info.as_ref().and_then(ModuleInfo::vendor) {
        return Some(vendor);
    }
    let info = probe.info.as_ref()?;
    info.first_string(VENDOR_KEYS).or_else(|| {
        info.audio_component_names()
            .into_iter()
            .find_map(|name| name.split_once(':'))
            .map(|(vendor, _)| vendor.trim().to_string())
    })
}

fn manufacturer_from_bundle_identifier(probe: &Probe) -> Option<String> {
    let id = probe.info.as_ref()?.bundle_identifier()?;
    vendor_from_bundle_identifier(id)
}

/// `com.native-instruments.Kontakt` → `Native Instruments`.
pub fn vendor_from_bundle_identifier(id: &str) -> Option<String> {
    let mut segments = id.split('.');
    segments.next()?;
    let vendor = segments.next()?;
    if vendor.is_empty() {
        return None;
    }
    Some(patterns::title_case(vendor))
}

fn manufacturer_from_copyright(probe: &Probe) -> Option<String> {
    let notice = probe.info.as_ref()?.string("NSHumanReadableCopyright")?;
    patterns::copyright_holder(notice)
}

fn manufacturer_from_file_name(probe: &Probe) -> Option<String> {
    if probe.packaging != Some(Packaging::Vst) {
        return None;
    }
    let stem = probe.stem()?;
    let mut words = stem.split_whitespace();
    let first = words.next()?;
    words.next().map(|_| first.to_string())
}

fn manufacturer_from_parent_directory(probe: &Probe) -> Option<String> {
    let parent = probe.path.parent()?.file_name()?.to_str()?;
    if GENERIC_FOLDERS.iter().any(|g| g.eq_ignore_ascii_case(parent)) {
        return None;
    }
    Some(parent.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::fixtures::{write_info_plist, write_resource};
    use crate::plugin::UNKNOWN;
    use std::fs;
    use tempfile::TempDir;

    /// Creates `<tmp>/<dir>/<name>` as an empty bundle directory.
    fn bundle(tmp: &TempDir, dir: &str, name: &str) -> PathBuf {
        let path = tmp.path().join(dir).join(name);
        fs::create_dir_all(&path).unwrap();
        path
    }

    #[test]
    fn test_short_version_string() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "Components", "Reverb.component");
        write_info_plist(&path, &[("CFBundleShortVersionString", "2.1.4")]);
        assert_eq!(extract_version(&path), "2.1.4");
    }

    #[test]
    fn test_short_version_beats_build_number() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "Components", "Reverb.component");
        write_info_plist(
            &path,
            &[("CFBundleVersion", "2104"), ("CFBundleShortVersionString", "2.1.4")],
        );
        assert_eq!(extract_version(&path), "2.1.4");
    }

    #[test]
    fn test_build_number_when_short_version_missing() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "Components", "Reverb.component");
        write_info_plist(&path, &[("CFBundleVersion", "2104")]);
        assert_eq!(extract_version(&path), "2104");
    }

    #[test]
    fn test_bundle_identifier_manufacturer() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "Components", "SuperComp.component");
        write_info_plist(&path, &[("CFBundleIdentifier", "com.acme.SuperComp")]);
        assert_eq!(extract_manufacturer(&path), "Acme");
    }

    #[test]
    fn test_vendor_name_beats_bundle_identifier() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "Components", "SuperComp.component");
        write_info_plist(
            &path,
            &[
                ("CFBundleIdentifier", "com.acme.SuperComp"),
                ("AudioUnitVendorName", "Acme Audio Labs"),
            ],
        );
        assert_eq!(extract_manufacturer(&path), "Acme Audio Labs");
    }

    #[test]
    fn test_hyphenated_bundle_identifier() {
        assert_eq!(
            vendor_from_bundle_identifier("com.native-instruments.Kontakt").as_deref(),
            Some("Native Instruments")
        );
        assert_eq!(vendor_from_bundle_identifier("Kontakt"), None);
        assert_eq!(vendor_from_bundle_identifier("com..Kontakt"), None);
    }

    #[test]
    fn test_copyright_manufacturer() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "Components", "Delay.component");
        write_info_plist(&path, &[("NSHumanReadableCopyright", "© 2022 Native Instruments GmbH")]);
        assert_eq!(extract_manufacturer(&path), "Native Instruments GmbH");
    }

    #[test]
    fn test_vst3_module_info_first() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "VST3", "Synth.vst3");
        write_resource(&path, "moduleinfo.json", r#"{"version": "3.0.1", "vendor": "Sidecar Audio"}"#);
        write_info_plist(
            &path,
            &[("CFBundleShortVersionString", "9.9.9"), ("CFBundleIdentifier", "com.plist.Synth")],
        );
        assert_eq!(extract_version(&path), "3.0.1");
        assert_eq!(extract_manufacturer(&path), "Sidecar Audio");
    }

    #[test]
    fn test_vst3_broken_module_info_falls_through() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "VST3", "Synth.vst3");
        write_resource(&path, "moduleinfo.json", "{{{{");
        write_info_plist(
            &path,
            &[("CFBundleShortVersionString", "1.5"), ("CFBundleIdentifier", "com.plist.Synth")],
        );
        assert_eq!(extract_version(&path), "1.5");
        assert_eq!(extract_manufacturer(&path), "Plist");
    }

    #[test]
    fn test_vst2_resource_file_and_name_convention() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "VST", "Oldco Synth.vst");
        write_resource(&path, "plugin.info", "Name: Synth\nVersion: 1.4\n");
        assert_eq!(extract_version(&path), "1.4");
        assert_eq!(extract_manufacturer(&path), "Oldco");
    }

    #[test]
    fn test_file_name_version() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "VST3", "Pro-Q 3.2.1.vst3");
        assert_eq!(extract_version(&path), "3.2.1");
    }

    #[test]
    fn test_waves_directory_version() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "Applications/Waves/Plug-Ins V14/Waves", "SSLComp.bundle");
        assert_eq!(extract_version(&path), "14");
        assert_eq!(extract_manufacturer(&path), "Waves");
    }

    #[test]
    fn test_waves_directory_version_without_disk() {
        // nothing on disk: only path heuristics apply
        let path = Path::new("/Applications/Waves/Plug-Ins V14/Waves/SSLComp.bundle");
        assert_eq!(extract_version(path), "14");
        assert_eq!(extract_manufacturer(path), "Waves");
    }

    #[test]
    fn test_waves_directory_beats_plist() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "Applications/Waves/Plug-Ins V12/Waves", "CLA-76.bundle");
        write_info_plist(&path, &[("CFBundleShortVersionString", "12.0.7")]);
        assert_eq!(extract_version(&path), "12");
    }

    #[test]
    fn test_waves_leaf_version() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "Library/Application Support/Waves/Plug-Ins", "Waves H-Comp V9.2.bundle");
        assert_eq!(extract_version(&path), "9.2");
    }

    #[test]
    fn test_parent_directory_manufacturer() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "Components/FabFilter", "Pro-Q.component");
        assert_eq!(extract_manufacturer(&path), "FabFilter");
    }

    #[test]
    fn test_generic_parent_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "Library/Audio/Plug-Ins/Components", "Bare.component");
        assert_eq!(extract_manufacturer(&path), UNKNOWN);
        assert_eq!(extract_version(&path), UNKNOWN);
    }

    #[test]
    fn test_empty_manifest_values_fall_through() {
        let tmp = TempDir::new().unwrap();
        let path = bundle(&tmp, "Components", "Blank.component");
        write_info_plist(
            &path,
            &[("CFBundleShortVersionString", ""), ("AudioUnitVendorName", " ")],
        );
        assert_eq!(extract_version(&path), UNKNOWN);
        assert_eq!(extract_manufacturer(&path), UNKNOWN);
    }

    #[test]
    fn test_display_name() {
        let tmp = TempDir::new().unwrap();
        let waves = bundle(&tmp, "Plug-Ins V14/Waves", "Waves SSLComp.bundle");
        assert_eq!(Probe::open(&waves).display_name(), "SSLComp");

        let other = bundle(&tmp, "Components", "Waves Of Sound.component");
        assert_eq!(Probe::open(&other).display_name(), "Waves Of Sound");
    }

    #[test]
    fn test_is_vendor_path() {
        assert!(is_vendor_path(Path::new("/Applications/Waves/Plug-Ins V14/Waves/X.bundle")));
        assert!(is_vendor_path(Path::new("/Plug-Ins/Waves X.bundle")));
        assert!(!is_vendor_path(Path::new("/Library/Audio/Plug-Ins/Components/Wavesfactory.component")));
        assert!(!is_vendor_path(Path::new("/Components/Waves Of Sound.component")));
    }
}
