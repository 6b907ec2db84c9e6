//! Scanner configuration.
//!
//! Configuration is optional. It lives in `<config_dir>/pluginscope/config.json`
//! (or the file named by `PLUGINSCOPE_CONFIG`) and every field has a default:
//!
//! ```json
//! {
//!   "workers": 4,
//!   "skip_user_roots": false,
//!   "extra_roots": [
//!     { "family": "vst", "path": "/Volumes/Studio/VST3" }
//!   ]
//! }
//! ```
//!
//! `PLUGINSCOPE_WORKERS` overrides `workers`.

use crate::catalog::{Catalog, CatalogRoot};
use crate::error::{Result, ScanError};
use crate::registry::ScanOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_ENV: &str = "PLUGINSCOPE_CONFIG";
pub const WORKERS_ENV: &str = "PLUGINSCOPE_WORKERS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Worker threads per scan; `None` picks from the available cores.
    pub workers: Option<usize>,
    /// Roots scanned in addition to the platform catalog.
    pub extra_roots: Vec<CatalogRoot>,
    /// Ignore per-user plugin folders under the home directory.
    pub skip_user_roots: bool,
}

impl ScanConfig {
    /// `<config_dir>/pluginscope/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("pluginscope").join("config.json"))
    }

    /// Loads the configuration file (if any) and applies environment overrides.
    ///
    /// # Errors
    /// `ScanError::Config` if the file exists but cannot be read or parsed, or
    /// if an override is invalid.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(Self::default_path);
        let config = match path {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Loads `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text).map_err(|e| {
                ScanError::Config(format!("{}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ScanError::Config(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: ScanConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides looked up by environment variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(WORKERS_ENV) {
            let workers = raw.trim().parse::<usize>().map_err(|_| {
                ScanError::Config(format!("{WORKERS_ENV} must be a positive integer, got {raw:?}"))
            })?;
            self.workers = Some(workers);
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(ScanError::Config("workers must be at least 1".to_string()));
        }
        Ok(())
    }

    /// The platform catalog adjusted by this configuration.
    pub fn catalog(&self) -> Catalog {
        let home = dirs::home_dir();
        self.apply_to(Catalog::system_default(), home.as_deref())
    }

    /// Applies `skip_user_roots` and `extra_roots` to `base`.
    pub fn apply_to(&self, base: Catalog, home: Option<&Path>) -> Catalog {
        let mut catalog = match home {
            Some(home) if self.skip_user_roots => base.without_roots_under(home),
            _ => base,
        };
        for root in &self.extra_roots {
            catalog.push(root.family, root.path.clone());
        }
        catalog
    }

    pub fn scan_options(&self) -> ScanOptions {
        match self.workers {
            Some(workers) => ScanOptions { workers },
            None => ScanOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Family;
    use tempfile::TempDir;

    #[test]
    fn test_empty_json_is_default() {
        let config = ScanConfig::from_json("{}").unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config = ScanConfig::from_json(
            r#"{
                "workers": 3,
                "skip_user_roots": true,
                "extra_roots": [{ "family": "waves", "path": "/Volumes/Studio/Waves" }]
            }"#,
        )
        .unwrap();
        assert_eq!(config.workers, Some(3));
        assert!(config.skip_user_roots);
        assert_eq!(config.extra_roots[0].family, Family::Waves);
        assert_eq!(config.scan_options().workers, 3);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = ScanConfig::from_json(r#"{"workers": 0}"#).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn test_unknown_family_rejected() {
        let err = ScanConfig::from_json(r#"{"extra_roots": [{"family": "lv2", "path": "/x"}]}"#)
            .unwrap_err();
        assert!(matches!(err, ScanError::Json(_)));
    }

    #[test]
    fn test_missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let config = ScanConfig::load_from(&tmp.path().join("nope.json")).unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ workers: ").unwrap();
        let err = ScanConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_env_override() {
        let config = ScanConfig::default()
            .with_overrides(|key| (key == WORKERS_ENV).then(|| "2".to_string()))
            .unwrap();
        assert_eq!(config.workers, Some(2));

        let err = ScanConfig::default()
            .with_overrides(|_| Some("lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(WORKERS_ENV));
    }

    #[test]
    fn test_apply_to_catalog() {
        let home = Path::new("/Users/tester");
        let config = ScanConfig {
            skip_user_roots: true,
            extra_roots: vec![CatalogRoot {
                family: Family::AudioUnit,
                path: PathBuf::from("/Volumes/Studio/Components"),
            }],
            ..Default::default()
        };
        let catalog = config.apply_to(Catalog::macos(home), Some(home));
        assert!(catalog.roots().iter().all(|r| !r.path.starts_with(home)));
        // extra AU root is grouped with the other AU roots
        assert_eq!(catalog.roots()[1].path, PathBuf::from("/Volumes/Studio/Components"));
    }
}
