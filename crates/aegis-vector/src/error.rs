//! Error types for aegis-vector.

use thiserror::Error;

/// Result type for aegis-vector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in aegis-vector operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Dimension mismatch between a vector and the index.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensions the index was created with.
        expected: usize,
        /// Dimensions of the vector provided.
        actual: usize,
    },

    /// Record not found.
    #[error("Record '{0}' not found")]
    RecordNotFound(String),

    /// Invalid vector (e.g., empty, contains NaN or infinity).
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// Persistence error (serialization, corrupt snapshot).
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
