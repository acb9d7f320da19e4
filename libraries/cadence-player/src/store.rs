//! Player state store
//!
//! Owns the current [`PlayerState`] and is the only writer of it. Intents go
//! through [`PlayerStore::commit`], which applies the engine's transition
//! synchronously and hands back the telemetry it still owes as
//! [`PendingReports`]. [`PlayerStore::report`] performs that telemetry and
//! may run on another task while further intents are committed. A play
//! session id is attached to the state only if no newer track change has
//! been committed in the meantime.
//!
//! [`PlayerStore::dispatch`] does both steps in one call.

use crate::engine::{self, Intent, SkipReport};
use crate::error::Result;
use crate::events::{Alert, MediaFailure, PlayerEvent};
use crate::state::PlayerState;
use crate::telemetry::{TelemetryBackend, TelemetryReporter};
use crate::types::{PlayId, PlayerConfig};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, trace};

/// What happened to the play session a transition asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The transition kept the current session
    NotRequested,
    /// Backend confirmed the session and it was attached
    Attached(PlayId),
    /// A newer track change was committed before the backend answered
    Superseded,
    /// Backend call failed or timed out; the track plays without a session
    Failed,
}

/// Result of a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Whether the state changed
    pub changed: bool,
    pub session: SessionOutcome,
}

impl DispatchOutcome {
    fn unchanged() -> Self {
        Self {
            changed: false,
            session: SessionOutcome::NotRequested,
        }
    }
}

struct Inner {
    state: Arc<PlayerState>,
    /// Incremented on every committed transition
    sequence: u64,
    /// Sequence of the latest transition that requested a session
    session_sequence: u64,
    events: Vec<PlayerEvent>,
}

/// Telemetry a committed transition still owes the backend
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReports {
    sequence: u64,
    skip: Option<SkipReport>,
    play: Option<String>,
}

impl PendingReports {
    /// Whether there is nothing to send
    pub fn is_empty(&self) -> bool {
        self.skip.is_none() && self.play.is_none()
    }
}

/// Injectable owner of the player state
pub struct PlayerStore {
    inner: Mutex<Inner>,
    snapshots: watch::Sender<Arc<PlayerState>>,
    reporter: TelemetryReporter,
}

impl PlayerStore {
    /// Create a store in the initial (stopped) state
    pub fn new(backend: Arc<dyn TelemetryBackend>, config: PlayerConfig) -> Self {
        let state = Arc::new(PlayerState::new());
        let (snapshots, _) = watch::channel(Arc::clone(&state));

        Self {
            inner: Mutex::new(Inner {
                state,
                sequence: 0,
                session_sequence: 0,
                events: Vec::new(),
            }),
            snapshots,
            reporter: TelemetryReporter::new(backend, config.report_timeout),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<PlayerState> {
        Arc::clone(&self.lock().state)
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<PlayerState>> {
        self.snapshots.subscribe()
    }

    /// Take all events recorded since the last drain
    pub fn drain_events(&self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.lock().events)
    }

    /// Apply an intent and carry out the telemetry it requires
    ///
    /// The new state is visible to readers before any backend call starts.
    /// Telemetry failures never fail the dispatch; they are logged and
    /// surfaced as [`PlayerEvent::Alert`].
    pub async fn dispatch(&self, intent: Intent) -> Result<DispatchOutcome> {
        let Some(pending) = self.commit(intent)? else {
            return Ok(DispatchOutcome::unchanged());
        };

        let session = self.report(pending).await;
        Ok(DispatchOutcome {
            changed: true,
            session,
        })
    }

    /// Feed a position sample from the media element
    ///
    /// Fires [`Intent::TrackEnded`] once the position reaches a known
    /// duration while playing.
    pub async fn on_time_update(&self, position: f64) -> Result<DispatchOutcome> {
        let Some(pending) = self.commit_time_update(position)? else {
            return Ok(DispatchOutcome::unchanged());
        };

        let session = self.report(pending).await;
        Ok(DispatchOutcome {
            changed: true,
            session,
        })
    }

    /// Synchronous half of [`PlayerStore::on_time_update`]
    pub fn commit_time_update(&self, position: f64) -> Result<Option<PendingReports>> {
        let Some(pending) = self.commit(Intent::TimeUpdate(position))? else {
            return Ok(None);
        };

        let ended = {
            let state = self.snapshot();
            state.is_playing && state.duration > 0.0 && position >= state.duration
        };
        if ended {
            return self.commit(Intent::TrackEnded);
        }
        Ok(Some(pending))
    }

    /// Media metadata loaded with the real duration
    pub fn on_duration_loaded(&self, duration: f64) -> Result<bool> {
        self.commit_local(Intent::DurationLoaded(duration))
    }

    /// The media element could not load the current track
    pub fn report_media_failure(&self, failure: MediaFailure) -> Result<bool> {
        self.commit_local(Intent::MediaFailed(failure))
    }

    /// Commit an intent that never touches telemetry
    pub(crate) fn commit_local(&self, intent: Intent) -> Result<bool> {
        Ok(self.commit(intent)?.is_some())
    }

    /// Apply an intent to the state without waiting on the backend
    ///
    /// Returns `None` when the intent had no effect. The returned reports
    /// must be passed to [`PlayerStore::report`] for the play session to be
    /// opened.
    pub fn commit(&self, intent: Intent) -> Result<Option<PendingReports>> {
        let name = intent.name();
        let mut inner = self.lock();
        let Some(transition) = engine::apply(&inner.state, intent)? else {
            trace!(intent = name, "Intent had no effect");
            return Ok(None);
        };

        inner.sequence += 1;
        let sequence = inner.sequence;
        if transition.requires_session() {
            inner.session_sequence = sequence;
        }

        for event in &transition.events {
            if let PlayerEvent::TrackChanged { track_id, .. } = event {
                info!(track_id = %track_id, "Track changed");
            }
        }
        inner.events.extend(transition.events);
        self.publish(&mut inner, transition.state);

        Ok(Some(PendingReports {
            sequence,
            skip: transition.skip,
            play: transition.play,
        }))
    }

    /// Send the reports of a committed transition
    ///
    /// Failures are logged and surfaced as [`PlayerEvent::Alert`].
    pub async fn report(&self, pending: PendingReports) -> SessionOutcome {
        let PendingReports {
            sequence,
            skip,
            play,
        } = pending;

        // Skip is polled first so it reaches the backend before the play
        let skip_report = async {
            if let Some(report) = &skip {
                if let Err(e) = self.reporter.report_skip(report).await {
                    self.alert(Alert::warning(format!("Skip not recorded: {e}")));
                }
            }
        };
        let play_report = async {
            match &play {
                Some(track_id) => Some(self.reporter.report_play(track_id).await),
                None => None,
            }
        };
        let ((), play_result) = tokio::join!(skip_report, play_report);

        match (play, play_result) {
            (Some(track_id), Some(Ok(play_id))) => {
                self.attach_session(sequence, &track_id, play_id)
            }
            (Some(_), Some(Err(e))) => {
                self.alert(Alert::warning(format!("Listening history unavailable: {e}")));
                SessionOutcome::Failed
            }
            _ => SessionOutcome::NotRequested,
        }
    }

    fn attach_session(&self, sequence: u64, track_id: &str, play_id: PlayId) -> SessionOutcome {
        let mut inner = self.lock();

        if inner.session_sequence != sequence || inner.state.current_track_id() != Some(track_id) {
            debug!(
                track_id,
                play_id = %play_id,
                "Dropping play session for a superseded transition"
            );
            return SessionOutcome::Superseded;
        }

        let mut next = PlayerState::clone(&inner.state);
        next.play_id = Some(play_id.clone());
        inner.events.push(PlayerEvent::SessionStarted {
            track_id: track_id.to_string(),
            play_id: play_id.clone(),
        });
        self.publish(&mut inner, next);

        SessionOutcome::Attached(play_id)
    }

    fn alert(&self, alert: Alert) {
        self.lock().events.push(PlayerEvent::Alert(alert));
    }

    fn publish(&self, inner: &mut Inner, state: PlayerState) {
        let state = Arc::new(state);
        inner.state = Arc::clone(&state);
        self.snapshots.send_replace(state);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for PlayerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerStore")
            .field("state", &self.snapshot())
            .field("reporter", &self.reporter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlayerError;
    use crate::types::Track;
    use async_trait::async_trait;

    struct FixedBackend;

    #[async_trait]
    impl TelemetryBackend for FixedBackend {
        async fn record_play(&self, track_id: &str) -> Result<PlayId> {
            Ok(PlayId::new(format!("play-{}", track_id)))
        }

        async fn record_skip(&self, _play_id: &PlayId, _skipped_at: f64) -> Result<()> {
            Ok(())
        }
    }

    fn create_test_track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            name: format!("Track {}", id),
            duration: 100,
            artists: vec![],
            album: None,
            cover_url: None,
            lyrics: None,
            downloaded: None,
        }
    }

    fn store() -> PlayerStore {
        PlayerStore::new(Arc::new(FixedBackend), PlayerConfig::default())
    }

    #[tokio::test]
    async fn dispatch_attaches_session() {
        let store = store();
        let outcome = store
            .dispatch(Intent::ClickTrack(create_test_track("a")))
            .await
            .unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.session, SessionOutcome::Attached(PlayId::new("play-a")));
        assert_eq!(store.snapshot().play_id, Some(PlayId::new("play-a")));
    }

    #[tokio::test]
    async fn rejected_intent_leaves_state() {
        let store = store();
        let before = store.snapshot();

        let result = store.dispatch(Intent::Seek(10.0)).await;
        assert!(matches!(result, Err(PlayerError::NoTrackLoaded)));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
        assert!(store.drain_events().is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_new_snapshots() {
        let store = store();
        let mut rx = store.subscribe();

        store
            .dispatch(Intent::ClickTrack(create_test_track("a")))
            .await
            .unwrap();

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.current_track_id(), Some("a"));
    }

    #[tokio::test]
    async fn time_update_reaching_duration_ends_track() {
        let store = store();
        store
            .dispatch(Intent::ClickTrack(create_test_track("a")))
            .await
            .unwrap();
        store.drain_events();

        store.on_time_update(50.0).await.unwrap();
        assert_eq!(store.snapshot().current_time, 50.0);

        store.on_time_update(100.0).await.unwrap();
        let state = store.snapshot();
        assert!(!state.is_playing);
        assert!(store
            .drain_events()
            .contains(&PlayerEvent::TrackFinished {
                track_id: "a".to_string()
            }));
    }

    #[tokio::test]
    async fn duration_and_media_failure() {
        let store = store();
        assert!(!store.on_duration_loaded(120.0).unwrap());

        store
            .dispatch(Intent::ClickTrack(create_test_track("a")))
            .await
            .unwrap();
        assert!(store.on_duration_loaded(120.5).unwrap());
        assert_eq!(store.snapshot().duration, 120.5);

        store.drain_events();
        assert!(store
            .report_media_failure(MediaFailure::Unauthorized)
            .unwrap());
        assert!(!store.snapshot().is_playing);
        assert!(store
            .drain_events()
            .iter()
            .any(|e| matches!(e, PlayerEvent::Alert(_))));
    }
}
