use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Placeholder shown when no extraction strategy produced a value.
pub const UNKNOWN: &str = "Unknown";

/// The closed set of plugin formats a scan can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginFormat {
    /// Apple Audio Unit (`.component`)
    AudioUnit,
    /// Steinberg VST2 and VST3 (`.vst`, `.vst3`, `.dll`)
    Vst,
    /// Avid AAX (`.aaxplugin`)
    Aax,
}

impl PluginFormat {
    pub const ALL: [PluginFormat; 3] = [PluginFormat::AudioUnit, PluginFormat::Vst, PluginFormat::Aax];

    /// Name used in exports and UI listings.
    pub fn display_name(self) -> &'static str {
        match self {
            PluginFormat::AudioUnit => "Audio Unit",
            PluginFormat::Vst => "VST/VST3",
            PluginFormat::Aax => "AAX",
        }
    }
}

impl fmt::Display for PluginFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A best-effort metadata value.
///
/// Absence is rendered as [`UNKNOWN`] through [`Detected::as_str`]; callers that
/// need to tell a real value from the placeholder use [`Detected::known`].
/// Empty and whitespace-only input is treated as absent, so the rendered form
/// is never an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Detected(Option<String>);

impl Detected {
    pub fn unknown() -> Self {
        Detected(None)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn known(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_known(&self) -> bool {
        self.0.is_some()
    }
}

impl From<Option<String>> for Detected {
    fn from(value: Option<String>) -> Self {
        Detected(value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
    }
}

impl From<String> for Detected {
    fn from(value: String) -> Self {
        if value == UNKNOWN {
            return Detected(None);
        }
        Detected::from(Some(value))
    }
}

impl From<Detected> for String {
    fn from(value: Detected) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Detected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One plugin found during a scan.
///
/// Records are built by the scan orchestrator and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct PluginRecord {
    id: Uuid,
    name: String,
    format: PluginFormat,
    path: PathBuf,
    version: Detected,
    manufacturer: Detected,
    size_bytes: u64,
    modified_at: DateTime<Utc>,
}

/// Everything a record needs apart from its identifier.
#[derive(Debug, Clone)]
pub(crate) struct RecordFields {
    pub name: String,
    pub format: PluginFormat,
    pub path: PathBuf,
    pub version: Detected,
    pub manufacturer: Detected,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
}

impl PluginRecord {
    pub(crate) fn new(fields: RecordFields) -> Self {
        PluginRecord {
            id: Uuid::new_v4(),
            name: fields.name,
            format: fields.format,
            path: fields.path,
            version: fields.version,
            manufacturer: fields.manufacturer,
            size_bytes: fields.size_bytes,
            modified_at: fields.modified_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> PluginFormat {
        self.format
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Version string, or [`UNKNOWN`].
    pub fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Manufacturer name, or [`UNKNOWN`].
    pub fn manufacturer(&self) -> &str {
        self.manufacturer.as_str()
    }

    pub fn version_detected(&self) -> &Detected {
        &self.version
    }

    pub fn manufacturer_detected(&self) -> &Detected {
        &self.manufacturer
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Compares everything except the identifier.
    pub fn same_content(&self, other: &PluginRecord) -> bool {
        self.name == other.name
            && self.format == other.format
            && self.path == other.path
            && self.version == other.version
            && self.manufacturer == other.manufacturer
            && self.size_bytes == other.size_bytes
            && self.modified_at == other.modified_at
    }
}

#[cfg(test)]
pub(crate) fn sample_record(name: &str, manufacturer: Option<&str>) -> PluginRecord {
    PluginRecord::new(RecordFields {
        name: name.to_string(),
        format: PluginFormat::AudioUnit,
        path: PathBuf::from(format!("/Library/Audio/Plug-Ins/Components/{name}.component")),
        version: Detected::from(Some("1.0.0".to_string())),
        manufacturer: Detected::from(manufacturer.map(str::to_string)),
        size_bytes: 2048,
        modified_at: DateTime::from_timestamp(1_740_700_800, 0).unwrap_or_default(),
    })
}
