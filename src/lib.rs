//! PluginScope Core Library
//!
//! Discovers installed audio plugins (Audio Unit, VST/VST3, AAX and
//! Waves-style shell bundles), extracts their name, version and manufacturer,
//! and exports the result as CSV or JSON.
//!
//! # Architecture
//!
//! The library is consumed both from Rust (the `pluginscope` CLI) and via FFI
//! by native UI frontends:
//! - **macOS**: static lib linked into a Swift app
//! - **Windows**: DLL loaded through P/Invoke
//!
//! # Modules
//!
//! ## Discovery (`catalog`, `classify`, `registry`)
//! - `Catalog::system_default()` - Platform plugin folders, grouped by family
//! - `classify()` - Entry name to plugin format
//! - `Scanner` / `scan()` - Parallel, cancellable scan of every catalog root
//!
//! ## Metadata (`metadata`, `manifest`, `patterns`)
//! - `extract_version()` / `extract_manufacturer()` - Ordered heuristic cascades
//!   over bundle manifests, vendor directory layout and file names
//!
//! ## Output (`export`, `ffi`)
//! - `to_delimited_text()` / `write_csv()` - CSV report
//! - `pluginscope_*` C functions for native frontends
//!
//! ## Configuration (`config`)
//! - `ScanConfig` - Optional JSON config plus `PLUGINSCOPE_*` environment overrides

pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod ffi;
pub mod manifest;
pub mod metadata;
pub mod patterns;
pub mod plugin;
pub mod registry;

pub use catalog::{Catalog, CatalogRoot, Family};
pub use classify::classify;
pub use config::ScanConfig;
pub use error::{Result, ScanError};
pub use export::{to_delimited_text, write_csv};
pub use metadata::{extract_manufacturer, extract_version};
pub use plugin::{Detected, PluginFormat, PluginRecord, UNKNOWN};
pub use registry::{scan, CancelToken, ScanHandle, ScanOptions, ScanReport, Scanner};
