//! Error types for the Cadence server client.

use thiserror::Error;

/// Errors that can occur when talking to the music server.
#[derive(Error, Debug)]
pub enum ServerClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned a non-success status
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Server answered with an `error` envelope
    #[error("Server reported: {0}")]
    Api(String),

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),

    /// Event stream ended before it started reporting
    #[error("Event stream closed unexpectedly")]
    StreamClosed,
}

/// Result type for server client operations.
pub type Result<T> = std::result::Result<T, ServerClientError>;
