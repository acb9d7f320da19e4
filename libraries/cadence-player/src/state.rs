//! Player state snapshot
//!
//! The single source of truth for what is playing. Snapshots are immutable
//! once published: every transition builds a new `PlayerState` and the store
//! swaps it in whole.

use crate::error::{PlayerError, Result};
use crate::history::History;
use crate::queue::Queue;
use crate::types::{PlayId, PlaylistRef, RepeatMode, Track};
use serde::{Deserialize, Serialize};

/// Transport state derived from a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportState {
    /// No track loaded
    Stopped,

    /// Currently playing
    Playing,

    /// Paused mid-track (or parked at the end of the last track)
    Paused,
}

/// Complete player state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerState {
    /// Track currently loaded into the media element
    pub current_track: Option<Track>,

    /// Transport flag (distinct from media buffering)
    pub is_playing: bool,

    /// Playback position in seconds
    pub current_time: f64,

    /// Track duration in seconds, authoritative once media metadata loads
    pub duration: f64,

    /// Tracks awaiting playback (front = next)
    pub queued_tracks: Queue,

    /// Tracks already played (last = most recent)
    pub previous_tracks: History,

    pub repeat: RepeatMode,

    /// Whether playlist queues are built shuffled
    pub shuffle: bool,

    /// Playlist currently driving the queue
    pub from_playlist: Option<PlaylistRef>,

    /// Telemetry session for the current track, once the backend confirmed it
    pub play_id: Option<PlayId>,
}

impl PlayerState {
    /// Empty state used at startup
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport(&self) -> TransportState {
        match (&self.current_track, self.is_playing) {
            (None, _) => TransportState::Stopped,
            (Some(_), true) => TransportState::Playing,
            (Some(_), false) => TransportState::Paused,
        }
    }

    /// Id of the current track, if any
    pub fn current_track_id(&self) -> Option<&str> {
        self.current_track.as_ref().map(|t| t.id.as_str())
    }

    /// Whether the queue is being driven by the given playlist
    pub fn is_from_playlist(&self, playlist_id: &str) -> bool {
        self.from_playlist
            .as_ref()
            .is_some_and(|p| p.id == playlist_id)
    }

    /// Ids of every track held by the player, history first, then the
    /// current track, then the queue
    pub fn playback_order(&self) -> Vec<&str> {
        self.previous_tracks
            .iter()
            .chain(self.current_track.iter())
            .chain(self.queued_tracks.iter())
            .map(|t| t.id.as_str())
            .collect()
    }

    /// Verify structural invariants of the snapshot
    pub fn check_invariants(&self) -> Result<()> {
        if self.current_track.is_none() && self.is_playing {
            return Err(PlayerError::InvalidOperation(
                "playing without a current track".to_string(),
            ));
        }
        if self.current_track.is_none() && self.play_id.is_some() {
            return Err(PlayerError::InvalidOperation(
                "play session without a current track".to_string(),
            ));
        }
        if self.current_time < 0.0 {
            return Err(PlayerError::InvalidSeekPosition(self.current_time));
        }
        Ok(())
    }
}
