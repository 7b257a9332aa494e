//! Error types for matricula.
//!
//! This module defines all error types used throughout the matricula crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for matricula operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Record Errors ===
    /// The requested record does not exist in the store.
    #[error("record {id} not found")]
    RecordNotFound {
        /// Identifier that was looked up.
        id: u64,
    },

    /// A record submitted by a caller is missing a required field.
    #[error("invalid record: {field} {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    // === Storage Errors ===
    /// The backing file contains data that is not a valid record list.
    #[error("malformed record file {path}: {source}")]
    Format {
        /// Path to the backing file.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        /// Path being written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to remove a file.
    #[error("failed to remove {path}: {source}")]
    FileRemove {
        /// Path being removed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Every id up to `u64::MAX` is taken, so no new id can be assigned.
    #[error("no record id left after {max} in {path}")]
    IdExhausted {
        /// Path to the backing file.
        path: PathBuf,
        /// Highest id in use.
        max: u64,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rendering a PDF receipt failed.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },
}

/// A specialized Result type for matricula operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error for a record field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Check if this error indicates a missing record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound { .. })
    }

    /// Check if this error indicates a corrupt backing file.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Check if this error came from the file system.
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            Self::FileRead { .. }
                | Self::FileWrite { .. }
                | Self::FileRemove { .. }
                | Self::DirectoryCreate { .. }
        )
    }

    /// Check if this error is a record validation failure.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
