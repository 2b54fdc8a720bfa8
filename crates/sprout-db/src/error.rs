//! Error types for the persistence layer.
//!
//! Callers treat every variant as recoverable: a failed load falls back to a
//! new game and a failed save leaves the pending changes queued.

/// Errors that can occur while reading or writing a document.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend refused or could not serve the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
