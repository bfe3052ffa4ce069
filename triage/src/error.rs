//! Error types for the triage engine
//!
//! - [`AdapterError`]: talking to the mailbox failed (transient or fatal)
//! - [`PersistenceError`]: the suppression store could not be read or written
//! - [`TriageError`]: what callers of the engine see
//!
//! A suppressed thread is not an error; it is a classifier verdict.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Mailbox unavailable: {0}")]
    Unavailable(String),

    #[error("Thread not found: {0}")]
    NotFound(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl AdapterError {
    /// Errors that make every further call in a run pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Unavailable(_))
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Corrupt record for {id}: {detail}")]
    Corrupt { id: String, detail: String },
}

impl From<r2d2::Error> for PersistenceError {
    fn from(e: r2d2::Error) -> Self {
        PersistenceError::Pool(e.to_string())
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(e: rusqlite::Error) -> Self {
        PersistenceError::Database(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("Mailbox error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("State store error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

// Front ends receive errors as plain strings.
impl Serialize for TriageError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<std::io::Error> for TriageError {
    fn from(err: std::io::Error) -> Self {
        TriageError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for TriageError {
    fn from(err: toml::de::Error) -> Self {
        TriageError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TriageError {
    fn from(err: serde_json::Error) -> Self {
        TriageError::InvalidInput(err.to_string())
    }
}

impl From<thread_classifier::RulesError> for TriageError {
    fn from(err: thread_classifier::RulesError) -> Self {
        TriageError::Config(err.to_string())
    }
}

/// Result type alias using TriageError
pub type Result<T> = std::result::Result<T, TriageError>;
