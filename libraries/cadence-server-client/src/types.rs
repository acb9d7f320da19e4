//! Types for Cadence server API requests and responses.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for connecting to a Cadence server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the API (e.g., "http://localhost:8080/api/v1")
    pub url: String,
    /// Upper bound on a whole request
    pub request_timeout: Duration,
    /// Upper bound on establishing the connection
    pub connect_timeout: Duration,
}

impl ServerConfig {
    /// Create a new server config with default timeouts.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Override both timeouts.
    pub fn with_timeouts(mut self, request: Duration, connect: Duration) -> Self {
        self.request_timeout = request;
        self.connect_timeout = connect;
        self
    }
}

// =============================================================================
// Telemetry Types
// =============================================================================

/// Response from `POST /record/play/{trackID}`.
#[derive(Debug, Deserialize)]
pub struct PlayResponse {
    pub play_id: String,
}

/// Request body for `POST /record/skip/{playID}`.
#[derive(Debug, Serialize)]
pub struct SkipRequest {
    /// Whole seconds into the track
    pub skipped_at: u64,
}

impl SkipRequest {
    /// Round a playback position down to whole seconds.
    pub fn at(position: f64) -> Self {
        Self {
            skipped_at: position.max(0.0).floor() as u64,
        }
    }
}

// =============================================================================
// Lyrics Types
// =============================================================================

/// Response from `GET /lyrics/{trackID}`.
#[derive(Debug, Deserialize)]
pub struct LyricsResponse {
    #[serde(default)]
    pub lyrics: String,
}

// =============================================================================
// Download Types
// =============================================================================

/// Progress of a server-side playlist download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistDownloadEvent {
    /// First event: how many tracks will be processed
    Started { num_tracks: usize },
    /// One track processed; `error` is set when it failed
    Progress { index: usize, error: Option<String> },
}

/// Raw payload of a download progress event.
#[derive(Debug, Deserialize)]
pub(crate) struct DownloadEventPayload {
    #[serde(default)]
    pub num_tracks: Option<usize>,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_request_floors_position() {
        assert_eq!(SkipRequest::at(42.9).skipped_at, 42);
        assert_eq!(SkipRequest::at(0.2).skipped_at, 0);
        assert_eq!(SkipRequest::at(-3.0).skipped_at, 0);
    }

    #[test]
    fn skip_request_body() {
        let body = serde_json::to_value(SkipRequest::at(61.5)).unwrap();
        assert_eq!(body, serde_json::json!({ "skipped_at": 61 }));
    }

    #[test]
    fn default_timeouts() {
        let config = ServerConfig::new("http://localhost:8080/api/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }
}
