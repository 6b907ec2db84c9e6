//! Error types for PluginScope.
//!
//! Scanning itself never fails on bad filesystem state; these errors cover the
//! surfaces around it (configuration, exporting, concurrent scan requests).

use thiserror::Error;

/// The primary error type for PluginScope operations.
#[derive(Error, Debug)]
pub enum ScanError {
    /// A scan was requested while another one is still running on the same scanner.
    #[error("A scan is already in progress")]
    AlreadyRunning,

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Writing an export failed.
    #[error("Export error: {0}")]
    Export(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for PluginScope operations.
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScanError::Config("workers must be positive".to_string());
        assert_eq!(err.to_string(), "Configuration error: workers must be positive");
        assert_eq!(ScanError::AlreadyRunning.to_string(), "A scan is already in progress");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ScanError = io_err.into();
        assert!(matches!(err, ScanError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }
}
