//! Readers for the metadata files found inside plugin bundles.
//!
//! Every reader returns `None` when the file is absent, unreadable or
//! malformed. Failures are logged at `debug` and never propagated: a bad
//! manifest only means the next heuristic gets a turn.

use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const INFO_PLIST: &str = "Contents/Info.plist";
pub const MODULE_INFO: &str = "Contents/Resources/moduleinfo.json";
pub const RESOURCE_INFO: &str = "Contents/Resources/plugin.info";

/// Parsed `Contents/Info.plist` of a bundle.
#[derive(Debug, Clone)]
pub struct InfoPlist {
    dict: plist::Dictionary,
}

impl InfoPlist {
    pub fn load(bundle: &Path) -> Option<Self> {
        let path = bundle.join(INFO_PLIST);
        if !path.is_file() {
            return None;
        }
        match plist::Value::from_file(&path) {
            Ok(value) => match value.into_dictionary() {
                Some(dict) => Some(InfoPlist { dict }),
                None => {
                    debug!(path = %path.display(), "Info.plist root is not a dictionary");
                    None
                }
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Failed to parse Info.plist");
                None
            }
        }
    }

    /// Non-empty string value of `key`.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.dict
            .get(key)
            .and_then(plist::Value::as_string)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The first of `keys` that holds a non-empty string.
    pub fn first_string(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.string(k)).map(str::to_string)
    }

    pub fn bundle_identifier(&self) -> Option<&str> {
        self.string("CFBundleIdentifier")
    }

    /// `AudioUnit Version`, given either as text or as the packed
    /// `0xMMMMmmbb` integer Audio Units use.
    pub fn audio_unit_version(&self) -> Option<String> {
        let value = self.dict.get("AudioUnit Version")?;
        if let Some(s) = value.as_string() {
            let s = s.trim();
            if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                return u64::from_str_radix(hex, 16).ok().map(unpack_au_version);
            }
            return Some(s.to_string()).filter(|s| !s.is_empty());
        }
        value.as_unsigned_integer().map(unpack_au_version)
    }

    /// `name` fields of the `AudioComponents` array, e.g. `"Acme: SuperComp"`.
    pub fn audio_component_names(&self) -> Vec<&str> {
        self.dict
            .get("AudioComponents")
            .and_then(plist::Value::as_array)
            .map(|components| {
                components
                    .iter()
                    .filter_map(plist::Value::as_dictionary)
                    .filter_map(|c| c.get("name").and_then(plist::Value::as_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn unpack_au_version(packed: u64) -> String {
    format!("{}.{}.{}", packed >> 16, (packed >> 8) & 0xFF, packed & 0xFF)
}

/// Parsed VST3 `moduleinfo.json` sidecar.
///
/// The SDK writes these with JSON5 conventions (comments, trailing commas), so
/// strict JSON is tried first and JSON5 second.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    value: JsonValue,
}

impl ModuleInfo {
    pub fn load(bundle: &Path) -> Option<Self> {
        let path = bundle.join(MODULE_INFO);
        if !path.is_file() {
            return None;
        }
        let text = read_text(&path)?;
        Self::parse(&text, &path)
    }

    fn parse(text: &str, path: &Path) -> Option<Self> {
        let value = match serde_json::from_str::<JsonValue>(text) {
            Ok(v) => v,
            Err(strict) => match json5::from_str::<JsonValue>(text) {
                Ok(v) => v,
                Err(e) => {
                    debug!(
                        path = %path.display(),
                        error = %e,
                        json_error = %strict,
                        "Failed to parse moduleinfo.json"
                    );
                    return None;
                }
            },
        };
        if !value.is_object() {
            debug!(path = %path.display(), "moduleinfo.json root is not an object");
            return None;
        }
        Some(ModuleInfo { value })
    }

    pub fn version(&self) -> Option<String> {
        self.top_level(&["version", "Version"])
    }

    pub fn vendor(&self) -> Option<String> {
        self.top_level(&["vendor", "Vendor"]).or_else(|| {
            self.value
                .get("Factory Info")
                .and_then(|f| f.get("Vendor"))
                .and_then(JsonValue::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
    }

    fn top_level(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| self.value.get(*k))
            .filter_map(JsonValue::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Contents of the legacy VST2 `plugin.info` resource file.
pub fn read_resource_info(bundle: &Path) -> Option<String> {
    let path = bundle.join(RESOURCE_INFO);
    if !path.is_file() {
        return None;
    }
    read_text(&path)
}

fn read_text(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Failed to read manifest");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::Path;

    /// Writes a minimal XML `Info.plist` with the given string keys.
    pub fn write_info_plist(bundle: &Path, entries: &[(&str, &str)]) {
        let mut body = String::new();
        for (key, value) in entries {
            body.push_str(&format!("\t<key>{key}</key>\n\t<string>{value}</string>\n"));
        }
        write_raw_plist(bundle, &body);
    }

    /// Writes an XML `Info.plist` whose `<dict>` body is `body`.
    pub fn write_raw_plist(bundle: &Path, body: &str) {
        let contents = bundle.join("Contents");
        fs::create_dir_all(&contents).unwrap();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
             <plist version=\"1.0\">\n<dict>\n{body}</dict>\n</plist>\n"
        );
        fs::write(contents.join("Info.plist"), xml).unwrap();
    }

    pub fn write_resource(bundle: &Path, name: &str, text: &str) {
        let resources = bundle.join("Contents").join("Resources");
        fs::create_dir_all(&resources).unwrap();
        fs::write(resources.join(name), text).unwrap();
    }
}
