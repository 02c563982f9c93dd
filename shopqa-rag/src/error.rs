//! Error types for the `shopqa-rag` crate.

use thiserror::Error;

/// Errors that can occur during synthesis, indexing, and answering.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding collaborator failed.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index collaborator failed.
    #[error("Vector index error ({backend}): {message}")]
    VectorIndex {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The collaborator rejected or crashed during index construction.
    #[error("Index build failed: {0}")]
    IndexBuild(String),

    /// The query was empty or whitespace-only.
    #[error("Invalid query: query must not be empty")]
    InvalidQuery,

    /// A collaborator failed while producing an answer.
    #[error("Answer failed: {0}")]
    AnswerFailed(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
