//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// Recoverable user mistakes (bad amount, unknown option) never show up
/// here: the wizard answers those with a re-prompt. Errors are reserved for
/// collaborator failures that the transport must see.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Session store error: {0}")]
    Session(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a delivery error
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a session store error
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the error came from the record store (CSV, IO or explicit)
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Csv(_) | Self::Io(_))
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
