//! Error types for Javelin
//!
//! This module defines all error types used throughout Javelin. Uses
//! `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use thiserror::Error;

/// The primary error type for Javelin operations.
#[derive(Error, Debug)]
pub enum JavelinError {
    /// Configuration-related errors (invalid config, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Plugin package errors (malformed packages, missing extension index,
    /// invalid descriptors, rejected installs, etc.)
    #[error("Plugin error: {0}")]
    Plugin(String),

    /// Process execution errors (spawn failures, timeouts, etc.)
    #[error("Exec error: {0}")]
    Exec(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Resource not found (commands, plugins, build tools, etc.)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Security violations (dangerous exec templates, path traversal, etc.)
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

/// A specialized `Result` type for Javelin operations.
pub type Result<T> = std::result::Result<T, JavelinError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = JavelinError::Config("missing plugin directory".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: missing plugin directory"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let javelin_err: JavelinError = io_err.into();
        assert!(matches!(javelin_err, JavelinError::Io(_)));
    }

    #[test]
    fn test_result_type() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }

    #[test]
    fn test_security_violation_display() {
        let err = JavelinError::SecurityViolation("dangerous exec template".to_string());
        assert_eq!(
            err.to_string(),
            "Security violation: dangerous exec template"
        );
    }
}
