//! Cadence Player - Playback State Machine
//!
//! UI-independent player core for Cadence.
//!
//! This crate provides:
//! - Player state store (single source of truth, snapshot subscription)
//! - Playback transition engine (playlists, queue, history, skip/previous)
//! - Listening telemetry (play sessions and skip reports)
//! - Repeat modes (Off, One, All) and queue shuffling
//! - Timestamped lyrics parsing and line tracking
//!
//! # Architecture
//!
//! `cadence-player` performs no I/O of its own:
//! - No HTTP client (telemetry goes through [`TelemetryBackend`])
//! - No media element (position and duration are fed in by the platform)
//! - No rendering (UIs subscribe to snapshots and drain [`PlayerEvent`]s)
//!
//! Transitions are pure functions in [`engine`]; [`PlayerStore`] commits them
//! and runs the telemetry they request.
//!
//! # Example: Dispatching intents
//!
//! ```rust
//! use async_trait::async_trait;
//! use cadence_player::{Intent, PlayId, PlayerConfig, PlayerStore, Result, TelemetryBackend};
//! use std::sync::Arc;
//!
//! struct NoopBackend;
//!
//! #[async_trait]
//! impl TelemetryBackend for NoopBackend {
//!     async fn record_play(&self, track_id: &str) -> Result<PlayId> {
//!         Ok(PlayId::new(format!("local-{track_id}")))
//!     }
//!
//!     async fn record_skip(&self, _play_id: &PlayId, _skipped_at: f64) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # let result = tokio_test_block(async {
//! let store = PlayerStore::new(Arc::new(NoopBackend), PlayerConfig::default());
//! store.dispatch(Intent::SkipForward).await?;
//! assert!(store.snapshot().current_track.is_none());
//! # Ok::<(), cadence_player::PlayerError>(())
//! # });
//! # result.unwrap();
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! # Example: Lyrics
//!
//! ```rust
//! use cadence_player::Lyrics;
//!
//! let lyrics = Lyrics::parse("[00:01.50]hello\n[00:03.00]world", 10.0);
//! assert!(lyrics.time_synced);
//! assert_eq!(lyrics.active_index(2.0), Some(0));
//! ```

mod control;
pub mod engine;
mod error;
pub mod events;
mod history;
pub mod lyrics;
mod queue;
mod shuffle;
mod state;
mod store;
mod telemetry;
pub mod types;

// Public exports
pub use control::PlaybackControl;
pub use engine::{Intent, SkipReport, Transition, RESTART_THRESHOLD_SECS};
pub use error::{PlayerError, Result};
pub use events::{Alert, AlertLevel, MediaFailure, PlayerEvent};
pub use history::History;
pub use lyrics::{LyricLine, Lyrics, LyricsTracker};
pub use queue::Queue;
pub use shuffle::shuffle_tracks;
pub use state::{PlayerState, TransportState};
pub use store::{DispatchOutcome, PendingReports, PlayerStore, SessionOutcome};
pub use telemetry::{TelemetryBackend, TelemetryReporter};
pub use types::{PlayId, PlayerConfig, Playlist, PlaylistHead, PlaylistRef, RepeatMode, Track};
