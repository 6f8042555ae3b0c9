//! Error types for the engram core library.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all engram operations.
#[derive(Error, Debug)]
pub enum EngramError {
    /// No procedural memory exists with the given name.
    #[error("No procedure named {0:?}")]
    ProcedureNotFound(String),

    /// `update_fact` found no semantic memory matching the previous text.
    #[error("No stored fact matches {0:?}")]
    NoMatchingFact(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite error from the graph backend.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The persisted memory file failed to parse. Recovered locally by
    /// quarantining the file and continuing with an empty store; surfaced
    /// here only for logging.
    #[error("Corrupt memory file {path}: {detail}")]
    CorruptStore {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Parse failure detail.
        detail: String,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, EngramError>;
