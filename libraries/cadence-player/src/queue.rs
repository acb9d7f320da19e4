//! Up-next queue
//!
//! Ordered list of tracks awaiting playback. Front = next to play.

use crate::error::{PlayerError, Result};
use crate::shuffle::shuffle_tracks;
use crate::types::Track;
use std::collections::VecDeque;

/// Queue of tracks awaiting playback
///
/// ```text
/// Currently Playing: Track A
/// ─────────────────────────────
/// Up Next:
///   - Track B   <- pop_next()
///   - Track C
///   - Track D
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Queue {
    tracks: VecDeque<Track>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self {
            tracks: VecDeque::new(),
        }
    }

    /// Add track to end of queue
    pub fn add_to_end(&mut self, track: Track) {
        self.tracks.push_back(track);
    }

    /// Put track at the front so it plays next
    pub fn add_next(&mut self, track: Track) {
        self.tracks.push_front(track);
    }

    /// Append several tracks, preserving their order
    pub fn extend(&mut self, tracks: impl IntoIterator<Item = Track>) {
        self.tracks.extend(tracks);
    }

    /// Take the next track to play
    pub fn pop_next(&mut self) -> Option<Track> {
        self.tracks.pop_front()
    }

    /// Move track from `from_index` to `to_index`
    pub fn reorder(&mut self, from_index: usize, to_index: usize) -> Result<()> {
        let total = self.tracks.len();
        if from_index >= total {
            return Err(PlayerError::IndexOutOfBounds(from_index));
        }
        if to_index >= total {
            return Err(PlayerError::IndexOutOfBounds(to_index));
        }

        if from_index == to_index {
            return Ok(());
        }

        if let Some(track) = self.tracks.remove(from_index) {
            self.tracks.insert(to_index, track);
        }
        Ok(())
    }

    /// Jump to the track at `index`
    ///
    /// Returns the tracks before `index` (in order) and the track at `index`.
    /// The queue keeps only the tail after `index`.
    pub fn skip_to_index(&mut self, index: usize) -> Option<(Vec<Track>, Track)> {
        if index >= self.tracks.len() {
            return None;
        }

        let skipped: Vec<Track> = self.tracks.drain(..index).collect();
        let target = self.tracks.pop_front()?;
        Some((skipped, target))
    }

    /// Shuffle queue in place (uniform random permutation)
    pub fn shuffle(&mut self) {
        shuffle_tracks(self.tracks.make_contiguous());
    }

    /// Whether a track with this id is queued
    pub fn contains(&self, track_id: &str) -> bool {
        self.tracks.iter().any(|t| t.id == track_id)
    }

    /// Remove every queued track, returning them in order
    pub fn take_all(&mut self) -> Vec<Track> {
        self.tracks.drain(..).collect()
    }

    /// Iterate tracks in play order
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// Number of queued tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl FromIterator<Track> for Queue {
    fn from_iter<I: IntoIterator<Item = Track>>(iter: I) -> Self {
        Self {
            tracks: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            name: format!("Track {}", id),
            duration: 180,
            artists: vec!["Test Artist".to_string()],
            album: Some("Test Album".to_string()),
            cover_url: None,
            lyrics: None,
            downloaded: None,
        }
    }

    fn ids(queue: &Queue) -> Vec<String> {
        queue.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn pop_next_takes_front() {
        let mut queue: Queue = ["1", "2", "3"].into_iter().map(create_test_track).collect();

        assert_eq!(queue.pop_next().unwrap().id, "1");
        assert_eq!(ids(&queue), vec!["2", "3"]);
    }

    #[test]
    fn add_next_and_end() {
        let mut queue = Queue::new();
        queue.add_to_end(create_test_track("2"));
        queue.add_next(create_test_track("1"));
        queue.add_to_end(create_test_track("3"));

        assert_eq!(ids(&queue), vec!["1", "2", "3"]);
    }

    #[test]
    fn reorder_moves_element() {
        let mut queue: Queue = ["1", "2", "3", "4"].into_iter().map(create_test_track).collect();

        queue.reorder(0, 2).unwrap();
        assert_eq!(ids(&queue), vec!["2", "3", "1", "4"]);

        queue.reorder(3, 0).unwrap();
        assert_eq!(ids(&queue), vec!["4", "2", "3", "1"]);
    }

    #[test]
    fn reorder_out_of_bounds() {
        let mut queue: Queue = ["1", "2"].into_iter().map(create_test_track).collect();

        assert!(matches!(
            queue.reorder(2, 0),
            Err(PlayerError::IndexOutOfBounds(2))
        ));
        assert!(matches!(
            queue.reorder(0, 5),
            Err(PlayerError::IndexOutOfBounds(5))
        ));
        assert_eq!(ids(&queue), vec!["1", "2"]);
    }

    #[test]
    fn skip_to_index_splits_queue() {
        let mut queue: Queue = ["1", "2", "3", "4"].into_iter().map(create_test_track).collect();

        let (skipped, target) = queue.skip_to_index(2).unwrap();
        let skipped: Vec<&str> = skipped.iter().map(|t| t.id.as_str()).collect();

        assert_eq!(skipped, vec!["1", "2"]);
        assert_eq!(target.id, "3");
        assert_eq!(ids(&queue), vec!["4"]);
    }

    #[test]
    fn skip_to_invalid_index() {
        let mut queue: Queue = ["1"].into_iter().map(create_test_track).collect();
        assert!(queue.skip_to_index(1).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn shuffle_keeps_tracks() {
        let mut queue: Queue = (0..10).map(|i| create_test_track(&i.to_string())).collect();
        queue.shuffle();

        let mut shuffled = ids(&queue);
        shuffled.sort();
        let mut expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        expected.sort();
        assert_eq!(shuffled, expected);
    }

    #[test]
    fn contains_and_take_all() {
        let mut queue: Queue = ["1", "2"].into_iter().map(create_test_track).collect();
        assert!(queue.contains("2"));
        assert!(!queue.contains("9"));

        let all = queue.take_all();
        assert_eq!(all.len(), 2);
        assert!(queue.is_empty());
    }
}
