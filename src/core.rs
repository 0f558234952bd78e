use std::path::Path;

use thiserror::Error;

/// Error types for the Chime application.
///
/// Covers configuration loading and parsing plus the top-level failures
/// surfaced by the binary. Service-specific errors live with their service
/// (see `services::playback::PlaybackError`).
#[derive(Error, Debug)]
pub enum ChimeError {
    /// Configuration validation error
    #[error("configuration validation failed for '{component}': {details}")]
    ConfigValidation {
        /// Component that failed validation
        component: String,
        /// Validation error details
        details: String,
    },

    /// I/O operation error with path context
    #[error("I/O error on '{path}': {details}")]
    IoError {
        /// Path where I/O error occurred
        path: std::path::PathBuf,
        /// I/O error details
        details: String,
    },

    /// Standard I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParseError {
        /// Location of TOML being parsed (file path or "string")
        location: String,
        /// Parse error details
        details: String,
    },

    /// Home or state directory could not be determined
    #[error("could not determine {0} directory")]
    MissingDirectory(&'static str),
}

/// A specialized `Result` type for Chime operations.
///
/// This type alias simplifies error handling by defaulting the error type
/// to `ChimeError` for all Chime operations.
pub type Result<T> = std::result::Result<T, ChimeError>;

impl ChimeError {
    /// Creates a TOML parsing error with optional file path context.
    ///
    /// # Arguments
    ///
    /// * `error` - The underlying parsing error
    /// * `path` - Optional path to the file that failed to parse
    pub fn toml_parse(error: impl std::fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => {
                let clean_path = p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
                clean_path.to_string_lossy().to_string()
            }
            None => "string".to_string(),
        };

        ChimeError::TomlParseError {
            location,
            details: error.to_string(),
        }
    }
}
