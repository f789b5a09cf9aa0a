//! Error types for the shiftrep-core library.

use thiserror::Error;

/// Main error type for the shiftrep library.
#[derive(Error, Debug)]
pub enum ShiftrepError {
    /// Period file persistence error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by a report store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to read or write a period file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to encode or decode CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row in a period file could not be interpreted.
    #[error("invalid row {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    /// Failure injected by an in-memory store.
    #[error("injected failure: {0}")]
    Injected(String),
}

/// Error raised when a notification could not be delivered.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct NotifyError(pub String);

/// Result type for the shiftrep library.
pub type Result<T> = std::result::Result<T, ShiftrepError>;
