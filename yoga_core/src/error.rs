//! Error types for the yoga_core library.

use crate::session::SessionState;
use std::io;
use uuid::Uuid;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for yoga_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Assessment store error
    #[error("Assessment error: {0}")]
    Assessment(String),

    /// Session duration must be a positive number of seconds
    #[error("Invalid session duration: {0} (must be a positive number of seconds)")]
    InvalidDuration(i64),

    /// The session cannot be reconfigured in its current state
    #[error("Session is busy ({state}); stop it before changing duration or exercise")]
    SessionBusy { state: SessionState },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// A completed session whose record could not be handed to persistence.
///
/// Never fatal: the session stays completed.
#[derive(Debug, thiserror::Error)]
#[error("Failed to persist session record {record_id}: {source}")]
pub struct PersistenceWarning {
    pub record_id: Uuid,
    #[source]
    pub source: Error,
}
