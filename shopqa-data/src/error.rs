//! Error types for the `shopqa-data` crate.

use thiserror::Error;

/// Errors that can occur while fetching or generating catalog records.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The relational store could not be reached at all.
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    /// The snapshot file could not be read, written, or parsed.
    #[error("Snapshot error ({path}): {message}")]
    Snapshot {
        /// The snapshot file involved.
        path: String,
        /// A description of the failure.
        message: String,
    },
}

/// A convenience result type for record-source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
