//! Error types for the `shopqa-model` crate.

use thiserror::Error;

/// Errors that can occur when calling a completion model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The API key is missing or empty.
    #[error("Model auth error: {0}")]
    Auth(String),

    /// The HTTP request could not be sent or completed.
    #[error("Model request failed: {0}")]
    Request(String),

    /// The API returned a non-success status.
    #[error("Model API returned {status}: {message}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Error detail extracted from the response body.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}

/// A convenience result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
