//! Error types for infotic.
//!
//! This module defines all error types used throughout the infotic crate,
//! providing detailed context for debugging and user-facing alerts.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for infotic operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A write would push the store past its quota.
    #[error("storage quota exceeded: writing '{key}' needs {required} bytes, quota is {quota}")]
    QuotaExceeded {
        /// Key being written.
        key: String,
        /// Total bytes the store would hold after the write.
        required: usize,
        /// Configured quota in bytes.
        quota: usize,
    },

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

    // === Capture Errors ===
    /// The node identifier was left empty.
    #[error("node id is required")]
    MissingNodeId,

    /// No photo was attached to the capture.
    #[error("a photo of the evidence is required")]
    MissingPhoto,

    /// The attached photo is not a base64 image data URI.
    #[error("invalid photo: {reason}")]
    InvalidPhoto {
        /// Why the photo was rejected.
        reason: String,
    },

    /// The evidence type is not one the capture form offers.
    #[error("unknown evidence kind: {0}")]
    UnknownEvidenceKind(String),

    /// The record could not be written to the ledger.
    #[error("failed to save evidence (storage full?)")]
    SaveFailed,

    /// The position provider failed.
    #[error("geolocation failed: {0}")]
    Geolocation(String),

    // === Session Errors ===
    /// The inspector name was rejected.
    #[error("invalid inspector: {reason}")]
    InvalidInspector {
        /// Why the name was rejected.
        reason: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for infotic operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new geolocation error.
    #[must_use]
    pub fn geolocation(message: impl Into<String>) -> Self {
        Self::Geolocation(message.into())
    }

    /// Create an invalid photo error.
    #[must_use]
    pub fn invalid_photo(reason: impl Into<String>) -> Self {
        Self::InvalidPhoto {
            reason: reason.into(),
        }
    }

    /// Create an invalid inspector error.
    #[must_use]
    pub fn invalid_inspector(reason: impl Into<String>) -> Self {
        Self::InvalidInspector {
            reason: reason.into(),
        }
    }

    /// Check if this error is a storage quota failure.
    #[must_use]
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    /// Check if this error comes from validating user input on the capture form.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::MissingNodeId
                | Self::MissingPhoto
                | Self::InvalidPhoto { .. }
                | Self::UnknownEvidenceKind(_)
                | Self::InvalidInspector { .. }
        )
    }
}
