//! FFI (Foreign Function Interface) bindings for native frontends.
//!
//! Exposes scanning and export through C-compatible functions callable from
//! Swift (macOS) and C# (Windows).
//!
//! # Memory Management
//!
//! - Rust allocates memory and returns pointers to Swift/C#
//! - The calling code MUST call the corresponding `_free` function for every
//!   pointer it receives
//! - Strings are null-terminated UTF-8
//!
//! # Usage from Swift (macOS)
//!
//! ```swift
//! guard let list = pluginscope_scan() else { return }  // nil: scan already running
//! defer { pluginscope_free_record_list(list) }
//!
//! let count = pluginscope_record_list_count(list)
//! for i in 0..<count {
//!     let record = pluginscope_record_list_get(list, i)
//!     defer { pluginscope_free_record(record) }
//!     // Use record data...
//! }
//! ```
//!
//! # Usage from C# (Windows)
//!
//! ```csharp
//! [DllImport("pluginscope_core.dll")]
//! private static extern IntPtr pluginscope_scan();
//!
//! [DllImport("pluginscope_core.dll")]
//! private static extern void pluginscope_free_record_list(IntPtr list);
//! ```

use crate::config::ScanConfig;
use crate::export::{to_delimited_text, write_csv};
use crate::plugin::{PluginFormat, PluginRecord};
use crate::registry::{CancelToken, Scanner};
use once_cell::sync::Lazy;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::path::PathBuf;
use std::ptr;
use tracing::error;

/// One scanner per process, so overlapping scans from the UI are refused.
static SCANNER: Lazy<Scanner> = Lazy::new(|| {
    let config = ScanConfig::load().unwrap_or_else(|e| {
        error!(error = %e, "Invalid configuration, using defaults");
        ScanConfig::default()
    });
    Scanner::from_config(&config)
});

// ============================================================================
// C-Compatible Types
// ============================================================================

/// Opaque handle to the records of one scan
#[repr(C)]
pub struct CRecordList {
    records: Vec<PluginRecord>,
}

/// C-compatible plugin record
#[repr(C)]
pub struct CPluginRecord {
    pub id: *mut c_char,
    pub name: *mut c_char,
    pub manufacturer: *mut c_char,
    pub version: *mut c_char,
    pub path: *mut c_char,
    pub format: c_int, // 0=AU, 1=VST, 2=AAX
    pub size_bytes: u64,
    /// Seconds since the Unix epoch
    pub modified_unix: i64,
}

// ============================================================================
// Scanning
// ============================================================================

/// Scan the system for installed plugins.
/// Returns an opaque handle to the record list, or null if a scan is already
/// running. Caller MUST call pluginscope_free_record_list() when done.
#[no_mangle]
pub extern "C" fn pluginscope_scan() -> *mut CRecordList {
    match SCANNER.scan(&CancelToken::new()) {
        Ok(report) => Box::into_raw(Box::new(CRecordList {
            records: report.records,
        })),
        Err(e) => {
            error!(error = %e, "Scan request rejected");
            ptr::null_mut()
        }
    }
}

/// Returns 1 while a scan started through pluginscope_scan() is in flight.
#[no_mangle]
pub extern "C" fn pluginscope_is_scanning() -> c_int {
    c_int::from(SCANNER.is_running())
}

/// Get the number of records in a list.
///
/// # Safety
/// `list` must be null or a pointer returned by pluginscope_scan() that has
/// not been freed.
#[no_mangle]
pub unsafe extern "C" fn pluginscope_record_list_count(list: *const CRecordList) -> c_int {
    match list.as_ref() {
        Some(list) => c_int::try_from(list.records.len()).unwrap_or(c_int::MAX),
        None => 0,
    }
}

/// Get the record at `index`.
/// Returns null if the list is null or the index is out of range.
/// Caller MUST call pluginscope_free_record() when done.
///
/// # Safety
/// `list` must be null or a live pointer returned by pluginscope_scan().
#[no_mangle]
pub unsafe extern "C" fn pluginscope_record_list_get(
    list: *const CRecordList,
    index: c_int,
) -> *mut CPluginRecord {
    let Some(list) = list.as_ref() else {
        return ptr::null_mut();
    };
    let Some(record) = usize::try_from(index).ok().and_then(|i| list.records.get(i)) else {
        return ptr::null_mut();
    };

    Box::into_raw(Box::new(CPluginRecord {
        id: string_to_c_char(&record.id().to_string()),
        name: string_to_c_char(record.name()),
        manufacturer: string_to_c_char(record.manufacturer()),
        version: string_to_c_char(record.version()),
        path: string_to_c_char(&record.path().to_string_lossy()),
        format: format_to_int(record.format()),
        size_bytes: record.size_bytes(),
        modified_unix: record.modified_at().timestamp(),
    }))
}

// ============================================================================
// Export
// ============================================================================

/// Render the list as CSV text.
/// Caller MUST call pluginscope_free_string() when done.
///
/// # Safety
/// `list` must be null or a live pointer returned by pluginscope_scan().
#[no_mangle]
pub unsafe extern "C" fn pluginscope_export_csv(list: *const CRecordList) -> *mut c_char {
    match list.as_ref() {
        Some(list) => string_to_c_char(&to_delimited_text(&list.records)),
        None => ptr::null_mut(),
    }
}

/// Write the list as CSV to `path` (".csv" is appended when missing).
/// Returns the path written, or null on error.
/// Caller MUST call pluginscope_free_string() when done.
///
/// # Safety
/// `list` must be null or a live pointer returned by pluginscope_scan();
/// `path` must be null or a valid null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn pluginscope_write_csv(
    list: *const CRecordList,
    path: *const c_char,
) -> *mut c_char {
    let Some(list) = list.as_ref() else {
        return ptr::null_mut();
    };
    if path.is_null() {
        return ptr::null_mut();
    }
    let path = match CStr::from_ptr(path).to_str() {
        Ok(s) => PathBuf::from(s),
        Err(_) => return ptr::null_mut(),
    };

    match write_csv(&list.records, &path) {
        Ok(written) => string_to_c_char(&written.to_string_lossy()),
        Err(e) => {
            error!(error = %e, "CSV export failed");
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a record list returned by pluginscope_scan().
///
/// # Safety
/// `list` must be null or a pointer returned by pluginscope_scan(), freed at
/// most once.
#[no_mangle]
pub unsafe extern "C" fn pluginscope_free_record_list(list: *mut CRecordList) {
    if !list.is_null() {
        drop(Box::from_raw(list));
    }
}

/// Free a record returned by pluginscope_record_list_get().
///
/// # Safety
/// `record` must be null or a pointer returned by
/// pluginscope_record_list_get(), freed at most once.
#[no_mangle]
pub unsafe extern "C" fn pluginscope_free_record(record: *mut CPluginRecord) {
    if !record.is_null() {
        let r = Box::from_raw(record);
        free_c_char(r.id);
        free_c_char(r.name);
        free_c_char(r.manufacturer);
        free_c_char(r.version);
        free_c_char(r.path);
    }
}

/// Free a string returned by FFI functions.
///
/// # Safety
/// `s` must be null or a string returned by this library, freed at most once.
#[no_mangle]
pub unsafe extern "C" fn pluginscope_free_string(s: *mut c_char) {
    free_c_char(s);
}

// ============================================================================
// Helper Functions
// ============================================================================

fn string_to_c_char(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(c_str) => c_str.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

unsafe fn free_c_char(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

fn format_to_int(format: PluginFormat) -> c_int {
    match format {
        PluginFormat::AudioUnit => 0,
        PluginFormat::Vst => 1,
        PluginFormat::Aax => 2,
    }
}
