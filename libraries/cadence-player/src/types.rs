//! Core types for the player

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Track information as served by the backend
///
/// Immutable value. Field names follow the backend's JSON so tracks can be
/// deserialized directly from playlist and search responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    #[serde(rename = "track_id")]
    pub id: String,

    /// Display name
    #[serde(rename = "track_name")]
    pub name: String,

    /// Duration in whole seconds
    pub duration: u32,

    /// Artist names, in credit order
    #[serde(default)]
    pub artists: Vec<String>,

    /// Album name (optional)
    #[serde(default, rename = "album_name", skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    /// Cover art URL (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,

    /// Raw timestamped lyrics, when the backend inlines them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,

    /// Whether the audio file is stored locally on the backend.
    /// `None` means the backend did not say.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloaded: Option<bool>,
}

impl Track {
    /// Duration as floating point seconds
    pub fn duration_secs(&self) -> f64 {
        f64::from(self.duration)
    }

    /// Artists joined for display
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

/// Playlist summary as returned by the playlist listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistHead {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub created_at: String,
}

/// Playlist with its tracks (insertion order = playback order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(flatten)]
    pub head: PlaylistHead,

    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Playlist {
    /// Playlist identifier
    pub fn id(&self) -> &str {
        &self.head.id
    }

    /// Lightweight reference used by the player state
    pub fn to_ref(&self) -> PlaylistRef {
        PlaylistRef {
            id: self.head.id.clone(),
            name: self.head.name.clone(),
        }
    }

    /// Total duration of all tracks in seconds
    pub fn total_duration(&self) -> u64 {
        self.tracks.iter().map(|t| u64::from(t.duration)).sum()
    }
}

/// Back-reference to the playlist currently driving the queue
///
/// Identity only. The playlist itself may be deleted independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRef {
    pub id: String,
    pub name: String,
}

/// Repeat mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop current track only
    One,

    /// Recycle history into the queue when it runs out
    All,
}

impl RepeatMode {
    /// Next mode in the off -> all -> one -> off cycle
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// Backend-issued play session token
///
/// Correlates a "play started" record with a later "play skipped" record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayId(String);

impl PlayId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configuration for the player store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Upper bound on a single play/skip report (default: 10s)
    pub report_timeout: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            report_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlayerConfig::default();
        assert_eq!(config.report_timeout, Duration::from_secs(10));
    }

    #[test]
    fn track_deserializes_from_backend_json() {
        let track: Track = serde_json::from_value(serde_json::json!({
            "track_id": "t1",
            "track_name": "Song",
            "duration": 215,
            "popularity": 40,
            "artists": ["A", "B"],
            "album_name": "Album",
            "cover_url": "http://img/1.png"
        }))
        .unwrap();

        assert_eq!(track.id, "t1");
        assert_eq!(track.name, "Song");
        assert_eq!(track.duration, 215);
        assert_eq!(track.artist_line(), "A, B");
        assert_eq!(track.album.as_deref(), Some("Album"));
        assert!(track.lyrics.is_none());
        assert!(track.downloaded.is_none());
    }

    #[test]
    fn playlist_flattens_head() {
        let playlist: Playlist = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Mix",
            "description": "d",
            "image_url": "http://img/p1.png",
            "created_at": "2024-01-01T00:00:00Z",
            "tracks": [
                {"track_id": "a", "track_name": "A", "duration": 60},
                {"track_id": "b", "track_name": "B", "duration": 90}
            ]
        }))
        .unwrap();

        assert_eq!(playlist.id(), "p1");
        assert_eq!(playlist.tracks.len(), 2);
        assert_eq!(playlist.total_duration(), 150);
        assert_eq!(playlist.to_ref().name, "Mix");
    }

    #[test]
    fn repeat_mode_cycles() {
        assert_eq!(RepeatMode::Off.cycle(), RepeatMode::All);
        assert_eq!(RepeatMode::All.cycle(), RepeatMode::One);
        assert_eq!(RepeatMode::One.cycle(), RepeatMode::Off);
    }
}
