//! Error types for player transitions and telemetry

use std::time::Duration;
use thiserror::Error;

/// Player errors
#[derive(Debug, Error)]
pub enum PlayerError {
    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Playlist has no tracks to play
    #[error("Playlist has no tracks")]
    EmptyPlaylist,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Invalid seek position (seconds)
    #[error("Invalid seek position: {0}s")]
    InvalidSeekPosition(f64),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Backend call failed
    #[error("Backend error: {0}")]
    Backend(String),

    /// Backend call did not resolve in time
    #[error("Backend call timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;
