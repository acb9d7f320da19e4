//! Queue randomization
//!
//! Uniform random permutation (Fisher-Yates). Re-rolled on every call,
//! never seeded or stable.

use crate::types::Track;
use rand::seq::SliceRandom;
use rand::thread_rng;

/// Shuffle tracks in place
pub fn shuffle_tracks(tracks: &mut [Track]) {
    let mut rng = thread_rng();
    tracks.shuffle(&mut rng);
}
