//! Exporting scan results.
//!
//! The delimited-text export is what native frontends save as `.csv`:
//!
//! ```text
//! Name,Manufacturer,Version,Format,Path,Size,LastModified
//! "Reverb","Acme","2.1.4","Audio Unit","/Library/Audio/Plug-Ins/Components/Reverb.component","2 KB","Feb 28, 2025 at 12:00 AM"
//! ```
//!
//! Every field is wrapped in double quotes and embedded quotes are doubled.

use crate::error::{Result, ScanError};
use crate::plugin::PluginRecord;
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const COLUMNS: [&str; 7] = [
    "Name",
    "Manufacturer",
    "Version",
    "Format",
    "Path",
    "Size",
    "LastModified",
];

/// Renders `records` as CSV, with dates in the local time zone.
pub fn to_delimited_text(records: &[PluginRecord]) -> String {
    to_delimited_text_in(records, &Local)
}

/// Renders `records` as CSV, with dates in `tz`.
pub fn to_delimited_text_in<Tz>(records: &[PluginRecord], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut csv = COLUMNS.join(",");
    csv.push('\n');

    for record in records {
        let path = record.path().to_string_lossy().into_owned();
        let size = format_size(record.size_bytes());
        let modified = format_timestamp(&record.modified_at().with_timezone(tz));
        let row = [
            record.name(),
            record.manufacturer(),
            record.version(),
            record.format().display_name(),
            path.as_str(),
            size.as_str(),
            modified.as_str(),
        ]
        .iter()
        .map(|field| quote(field))
        .collect::<Vec<_>>()
        .join(",");

        csv.push_str(&row);
        csv.push('\n');
    }

    csv
}

/// Writes the CSV export to `path`, adding a `.csv` extension when missing.
/// Returns the path actually written.
pub fn write_csv(records: &[PluginRecord], path: &Path) -> Result<PathBuf> {
    let target = with_csv_extension(path);
    fs::write(&target, to_delimited_text(records)).map_err(|e| {
        ScanError::Export(format!("Failed to write {}: {}", target.display(), e))
    })?;
    info!(path = %target.display(), plugins = records.len(), "Exported plugin list");
    Ok(target)
}

/// Records as a JSON array.
pub fn to_json(records: &[PluginRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

fn with_csv_extension(path: &Path) -> PathBuf {
    let has_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if has_csv {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".csv");
        PathBuf::from(name)
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// File-style decimal byte count: `Zero KB`, `512 bytes`, `12 KB`, `1.2 MB`, `3.45 GB`.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1_000.0;
    const MB: f64 = 1_000_000.0;
    const GB: f64 = 1_000_000_000.0;
    const TB: f64 = 1_000_000_000_000.0;

    match bytes {
        0 => return "Zero KB".to_string(),
        1 => return "1 byte".to_string(),
        2..=999 => return format!("{bytes} bytes"),
        _ => {}
    }

    let b = bytes as f64;
    let kb = (b / KB).round();
    if kb < 1_000.0 {
        return format!("{kb:.0} KB");
    }
    let mb = (b / MB * 10.0).round() / 10.0;
    if mb < 1_000.0 {
        return format!("{mb:.1} MB");
    }
    let gb = (b / GB * 100.0).round() / 100.0;
    if gb < 1_000.0 {
        return format!("{gb:.2} GB");
    }
    format!("{:.2} TB", b / TB)
}

/// Medium date with short time: `Feb 28, 2025 at 3:45 PM`.
pub fn format_timestamp<Tz>(ts: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.format("%b %-d, %Y at %-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::sample_record;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_header_and_row() {
        let records = vec![sample_record("Reverb", Some("Acme"))];
        let csv = to_delimited_text_in(&records, &Utc);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Name,Manufacturer,Version,Format,Path,Size,LastModified")
        );
        assert_eq!(
            lines.next(),
            Some(
                "\"Reverb\",\"Acme\",\"1.0.0\",\"Audio Unit\",\
                 \"/Library/Audio/Plug-Ins/Components/Reverb.component\",\
                 \"2 KB\",\"Feb 28, 2025 at 12:00 AM\""
            )
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_unknown_manufacturer_is_rendered() {
        let records = vec![sample_record("Reverb", None)];
        let csv = to_delimited_text_in(&records, &Utc);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("\"Reverb\",\"Unknown\","));
    }

    #[test]
    fn test_embedded_quotes_are_doubled() {
        let records = vec![sample_record("Big \"Bad\" Comp", Some("Acme, Inc"))];
        let csv = to_delimited_text_in(&records, &Utc);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("\"Big \"\"Bad\"\" Comp\",\"Acme, Inc\","));
    }

    #[test]
    fn test_empty_export_has_header_only() {
        assert_eq!(to_delimited_text(&[]), format!("{}\n", COLUMNS.join(",")));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "Zero KB");
        assert_eq!(format_size(1), "1 byte");
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2 KB");
        assert_eq!(format_size(999_600), "1.0 MB");
        assert_eq!(format_size(1_234_567), "1.2 MB");
        assert_eq!(format_size(3_450_000_000), "3.45 GB");
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 2, 28, 15, 45, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "Feb 28, 2025 at 3:45 PM");
        let morning = Utc.with_ymd_and_hms(2024, 11, 3, 9, 5, 0).unwrap();
        assert_eq!(format_timestamp(&morning), "Nov 3, 2024 at 9:05 AM");
    }

    #[test]
    fn test_write_csv_adds_extension() {
        let tmp = TempDir::new().unwrap();
        let records = vec![sample_record("Reverb", Some("Acme"))];

        let written = write_csv(&records, &tmp.path().join("plugins")).unwrap();
        assert_eq!(written, tmp.path().join("plugins.csv"));
        let text = fs::read_to_string(&written).unwrap();
        assert!(text.contains("\"Reverb\""));

        let kept = write_csv(&records, &tmp.path().join("list.CSV")).unwrap();
        assert_eq!(kept, tmp.path().join("list.CSV"));
    }

    #[test]
    fn test_write_csv_reports_failure() {
        let tmp = TempDir::new().unwrap();
        let err = write_csv(&[], &tmp.path().join("missing/dir/out.csv")).unwrap_err();
        assert!(matches!(err, ScanError::Export(_)));
    }

    #[test]
    fn test_to_json() {
        let records = vec![sample_record("Reverb", None)];
        let json = to_json(&records).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "Reverb");
        assert_eq!(value[0]["manufacturer"], "Unknown");
        assert_eq!(value[0]["format"], "audiounit");
    }
}
