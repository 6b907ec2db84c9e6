//! Text patterns used by the metadata heuristics.
//!
//! All regular expressions live here so they can be tested without touching
//! the filesystem.

use once_cell::sync::Lazy;
use regex::Regex;

/// `V14` in `Plug-Ins V14`.
static VENDOR_DIRECTORY_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bV([0-9]+)\b").expect("valid regex"));

/// `V9.2` in a Waves file name.
static VENDOR_LEAF_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bV([0-9]+(?:\.[0-9]+)?)\b").expect("valid regex"));

/// Two or more dot-separated digit groups: `2.1`, `10.0.3`.
static NUMERIC_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)+").expect("valid regex"));

/// `Version: 1.4.2` line in a plain-text resource file.
static RESOURCE_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Version:\s*([0-9]+(?:\.[0-9]+)*)").expect("valid regex"));

/// Holder of a copyright notice: text after the year, up to `.` or `,`.
static COPYRIGHT_HOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:©|\([cC]\)|(?i:copyright))\s*[0-9]{4}(?:\s*[-–]\s*[0-9]{4})?\s*([^.,]+)")
        .expect("valid regex")
});

/// Version encoded in a vendor directory name (`Plug-Ins V14` → `14`).
pub fn directory_version(dir_name: &str) -> Option<String> {
    VENDOR_DIRECTORY_VERSION
        .captures(dir_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Version encoded in a vendor file name (`Foo V9.2` → `9.2`).
pub fn vendor_leaf_version(file_name: &str) -> Option<String> {
    VENDOR_LEAF_VERSION
        .captures(file_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// First dotted version number in a file name.
pub fn numeric_version(file_name: &str) -> Option<String> {
    NUMERIC_VERSION.find(file_name).map(|m| m.as_str().to_string())
}

/// Value of the first `Version:` line in free text.
pub fn resource_version(text: &str) -> Option<String> {
    RESOURCE_VERSION
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Company named in a copyright notice.
pub fn copyright_holder(notice: &str) -> Option<String> {
    COPYRIGHT_HOLDER
        .captures(notice)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `native-instruments` → `Native Instruments`.
pub fn title_case(raw: &str) -> String {
    raw.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_version() {
        assert_eq!(directory_version("Plug-Ins V14").as_deref(), Some("14"));
        assert_eq!(directory_version("Plug-Ins V9").as_deref(), Some("9"));
        assert_eq!(directory_version("Plug-Ins"), None);
        assert_eq!(directory_version("VST3"), None);
        assert_eq!(directory_version(".tmpaV3xQz"), None);
    }

    #[test]
    fn test_vendor_leaf_version() {
        assert_eq!(vendor_leaf_version("CLA-76 V9.2.bundle").as_deref(), Some("9.2"));
        assert_eq!(vendor_leaf_version("SSLComp V12").as_deref(), Some("12"));
        assert_eq!(vendor_leaf_version("SSLComp"), None);
    }

    #[test]
    fn test_numeric_version() {
        assert_eq!(numeric_version("Pro-Q 3.2.1").as_deref(), Some("3.2.1"));
        assert_eq!(numeric_version("Serum 1.36").as_deref(), Some("1.36"));
        assert_eq!(numeric_version("Pro-Q 3"), None);
        assert_eq!(numeric_version("Synth"), None);
    }

    #[test]
    fn test_resource_version() {
        let text = "Name: Old Synth\nVersion: 1.4.2\nVendor: Someone\n";
        assert_eq!(resource_version(text).as_deref(), Some("1.4.2"));
        assert_eq!(resource_version("Version:   7").as_deref(), Some("7"));
        assert_eq!(resource_version("Version: n/a"), None);
    }

    #[test]
    fn test_copyright_holder() {
        assert_eq!(
            copyright_holder("© 2022 Native Instruments GmbH").as_deref(),
            Some("Native Instruments GmbH")
        );
        assert_eq!(
            copyright_holder("Copyright 2019 FabFilter, all rights reserved").as_deref(),
            Some("FabFilter")
        );
        assert_eq!(
            copyright_holder("Copyright © 2015-2023 Acme Audio Ltd.").as_deref(),
            Some("Acme Audio Ltd")
        );
        assert_eq!(copyright_holder("All rights reserved"), None);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("acme"), "Acme");
        assert_eq!(title_case("native-instruments"), "Native Instruments");
        assert_eq!(title_case("u_he"), "U He");
        assert_eq!(title_case("fabfilter"), "Fabfilter");
    }
}
