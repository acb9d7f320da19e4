//! Playback control handle
//!
//! Narrow interface for components that need to move the playhead without
//! holding the whole store, such as the lyrics view.

use crate::engine::Intent;
use crate::error::Result;
use crate::store::PlayerStore;

/// Seek access to the media element
pub trait PlaybackControl {
    /// Jump to `position` seconds in the current track
    fn seek(&self, position: f64) -> Result<()>;
}

impl PlaybackControl for PlayerStore {
    fn seek(&self, position: f64) -> Result<()> {
        // Seeking never opens or closes a play session
        self.commit_local(Intent::Seek(position)).map(|_| ())
    }
}
