//! Error types for the audit
//!
//! This module defines custom error types using thiserror for better error handling
//! throughout engine resolution, metadata reading and report writing.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for audit operations
#[derive(Error, Debug)]
pub enum AuditError {
    /// IO errors (file operations, directory access, etc.)
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing errors (ProjectVersion.txt, config files)
    #[error("YAML error in {file:?}: {source}")]
    Yaml {
        file: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON parsing errors (config files)
    #[error("JSON error in {file:?}: {source}")]
    Json {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Malformed PE image or CLI metadata
    #[error("Invalid metadata in {file:?}: {message}")]
    Metadata { file: PathBuf, message: String },

    /// The image is a native binary without a CLI header
    #[error("{file:?} is not a managed assembly")]
    NotManagedAssembly { file: PathBuf },

    /// No Unity installation could be located
    #[error("Unity installation not found: {message}")]
    EngineNotFound { message: String },

    /// The project does not declare an editor version
    #[error("Could not detect Unity version from {file:?}")]
    VersionNotFound { file: PathBuf },

    /// Invalid configuration values
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for audit operations
pub type AuditResult<T> = Result<T, AuditError>;

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        AuditError::Io {
            source: err,
            message: "IO operation failed".to_string(),
        }
    }
}

/// Helper trait for converting IO errors with context
pub trait IoContext<T> {
    fn with_io_context(self, message: &str) -> AuditResult<T>;
}

impl<T> IoContext<T> for Result<T, std::io::Error> {
    fn with_io_context(self, message: &str) -> AuditResult<T> {
        self.map_err(|e| AuditError::Io {
            message: message.to_string(),
            source: e,
        })
    }
}
