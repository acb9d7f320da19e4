//! Player Events
//!
//! Event-based communication for UI synchronization. The store records an
//! event for every observable change so a renderer can react without
//! diffing snapshots.

use crate::state::TransportState;
use crate::types::PlayId;
use serde::{Deserialize, Serialize};

/// Events emitted by the player store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// Transport state changed (playing, paused, stopped)
    StateChanged {
        /// The new transport state
        state: TransportState,
    },

    /// A different track became current
    TrackChanged {
        /// ID of the new (current) track
        track_id: String,
        /// ID of the outgoing track (if any)
        previous_track_id: Option<String>,
    },

    /// Track reached its end without being skipped
    TrackFinished {
        /// ID of the finished track
        track_id: String,
    },

    /// The media element must jump to a new position
    SeekRequested {
        /// Target position in seconds
        position: f64,
    },

    /// Queue changed (tracks added, removed, reordered or reshuffled)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Backend confirmed a play session for the current track
    SessionStarted {
        track_id: String,
        play_id: PlayId,
    },

    /// Non-fatal condition the user should see
    Alert(Alert),
}

/// Severity of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertLevel {
    /// Degraded behaviour, playback continues
    Warning,
    /// An operation failed for the current track
    Error,
}

/// Dismissible message for the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

impl Alert {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Error,
            message: message.into(),
        }
    }
}

/// Why the media element could not load a track
///
/// Classified from the HTTP status of a diagnostic re-fetch of the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaFailure {
    /// 400: the client built a bad stream request
    BadRequest,
    /// 401: the stream requires a login
    Unauthorized,
    /// 500: the backend failed, with its error envelope message
    Server { message: String },
    /// Any other status
    Other(u16),
}

impl MediaFailure {
    /// Classify an HTTP status code
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            400 => MediaFailure::BadRequest,
            401 => MediaFailure::Unauthorized,
            500 => MediaFailure::Server {
                message: message.unwrap_or_else(|| "unknown error".to_string()),
            },
            other => MediaFailure::Other(other),
        }
    }

    /// User-facing alert text
    pub fn describe(&self, track_name: &str) -> String {
        match self {
            MediaFailure::BadRequest => {
                format!("The player sent an invalid request for \"{track_name}\"")
            }
            MediaFailure::Unauthorized => format!("Log in to play \"{track_name}\""),
            MediaFailure::Server { message } => {
                format!("Playback error: {message} (playing: {track_name})")
            }
            MediaFailure::Other(status) => {
                format!("Could not load \"{track_name}\" (HTTP {status})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_failure_classification() {
        assert_eq!(MediaFailure::from_status(400, None), MediaFailure::BadRequest);
        assert_eq!(
            MediaFailure::from_status(401, None),
            MediaFailure::Unauthorized
        );
        assert_eq!(
            MediaFailure::from_status(500, Some("decoder crashed".to_string())),
            MediaFailure::Server {
                message: "decoder crashed".to_string()
            }
        );
        assert_eq!(MediaFailure::from_status(404, None), MediaFailure::Other(404));
    }

    #[test]
    fn media_failure_messages_are_distinct() {
        let bad = MediaFailure::BadRequest.describe("Song");
        let auth = MediaFailure::Unauthorized.describe("Song");
        let server = MediaFailure::Server {
            message: "disk full".to_string(),
        }
        .describe("Song");

        assert!(auth.contains("Log in"));
        assert!(server.contains("disk full"));
        assert!(server.contains("Song"));
        assert_ne!(bad, auth);
        assert_ne!(auth, server);
    }

    #[test]
    fn alert_constructors() {
        assert_eq!(Alert::warning("w").level, AlertLevel::Warning);
        assert_eq!(Alert::error("e").level, AlertLevel::Error);
    }
}
