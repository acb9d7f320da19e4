//! Playback history tracking
//!
//! Keeps the tracks already played for "previous" navigation

use crate::types::Track;

/// Playback history
///
/// Most recent = back. Unbounded: dropping old entries would silently lose
/// tracks from the queue/history partition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    tracks: Vec<Track>,
}

impl History {
    /// Create empty history
    pub fn new() -> Self {
        Self { tracks: Vec::new() }
    }

    /// Add track to history
    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Append several tracks, oldest first
    pub fn extend(&mut self, tracks: impl IntoIterator<Item = Track>) {
        self.tracks.extend(tracks);
    }

    /// Pop most recent track from history
    pub fn pop(&mut self) -> Option<Track> {
        self.tracks.pop()
    }

    /// Whether a track with this id has been played
    pub fn contains(&self, track_id: &str) -> bool {
        self.tracks.iter().any(|t| t.id == track_id)
    }

    /// Remove every entry, returning them oldest first
    pub fn take_all(&mut self) -> Vec<Track> {
        std::mem::take(&mut self.tracks)
    }

    /// Iterate oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// Get number of tracks in history
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

impl FromIterator<Track> for History {
    fn from_iter<I: IntoIterator<Item = Track>>(iter: I) -> Self {
        Self {
            tracks: iter.into_iter().collect(),
        }
    }
}
