//! Playback transition engine
//!
//! Computes the next [`PlayerState`] from the current one and a user or
//! media intent. Everything here is synchronous and side-effect free: the
//! telemetry a transition needs is returned alongside the new state and
//! carried out by the store.

use crate::error::{PlayerError, Result};
use crate::events::{Alert, MediaFailure, PlayerEvent};
use crate::history::History;
use crate::queue::Queue;
use crate::shuffle::shuffle_tracks;
use crate::state::PlayerState;
use crate::types::{PlayId, Playlist, RepeatMode, Track};

/// Seconds into a track after which "previous" restarts it instead of
/// going back in history
pub const RESTART_THRESHOLD_SECS: f64 = 3.0;

/// Something that may change the player state
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Play a whole playlist, or pause/resume it if it is already driving
    /// the queue
    PlayPlaylist { playlist: Playlist, shuffle: bool },

    /// Play a single track, keeping the queue
    ClickTrack(Track),

    /// Jump to a queued track
    ClickQueuedTrack(usize),

    SkipForward,

    /// Restart the current track or go back in history
    SkipBackward,

    /// Move a queued track from one position to another
    ReorderQueue { from: usize, to: usize },

    ToggleShuffle,

    /// The media element reached the end of the current track
    TrackEnded,

    /// Jump to a position (seconds) in the current track
    Seek(f64),

    TogglePlayPause,

    SetRepeat(RepeatMode),

    /// Append a track to the end of the queue
    Enqueue(Track),

    /// Level-triggered position sample from the media element
    TimeUpdate(f64),

    /// Media metadata loaded with the real duration
    DurationLoaded(f64),

    /// The media element could not load the current track
    MediaFailed(MediaFailure),
}

impl Intent {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Intent::PlayPlaylist { .. } => "play_playlist",
            Intent::ClickTrack(_) => "click_track",
            Intent::ClickQueuedTrack(_) => "click_queued_track",
            Intent::SkipForward => "skip_forward",
            Intent::SkipBackward => "skip_backward",
            Intent::ReorderQueue { .. } => "reorder_queue",
            Intent::ToggleShuffle => "toggle_shuffle",
            Intent::TrackEnded => "track_ended",
            Intent::Seek(_) => "seek",
            Intent::TogglePlayPause => "toggle_play_pause",
            Intent::SetRepeat(_) => "set_repeat",
            Intent::Enqueue(_) => "enqueue",
            Intent::TimeUpdate(_) => "time_update",
            Intent::DurationLoaded(_) => "duration_loaded",
            Intent::MediaFailed(_) => "media_failed",
        }
    }
}

/// Skip record for a track abandoned before completion
#[derive(Debug, Clone, PartialEq)]
pub struct SkipReport {
    /// Session of the outgoing track
    pub play_id: PlayId,
    /// Last known position of the outgoing track, in seconds
    pub position: f64,
}

/// Result of applying an intent
#[derive(Debug, Clone)]
pub struct Transition {
    /// The complete next state
    pub state: PlayerState,

    /// Skip to report for the outgoing track
    pub skip: Option<SkipReport>,

    /// Track that needs a fresh play session
    pub play: Option<String>,

    /// Events describing the change, in order
    pub events: Vec<PlayerEvent>,
}

impl Transition {
    /// Transition that keeps the current play session
    fn local(prev: &PlayerState, next: PlayerState) -> Self {
        let events = diff_events(prev, &next, false);
        Self {
            state: next,
            skip: None,
            play: None,
            events,
        }
    }

    /// Transition that starts a new listen of the (new) current track
    fn session(prev: &PlayerState, next: PlayerState, skip: Option<SkipReport>) -> Self {
        let events = diff_events(prev, &next, true);
        let play = next.current_track_id().map(str::to_string);
        Self {
            state: next,
            skip,
            play,
            events,
        }
    }

    fn preceded_by(mut self, event: PlayerEvent) -> Self {
        self.events.insert(0, event);
        self
    }

    fn followed_by(mut self, event: PlayerEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Whether the store must request a new play session
    pub fn requires_session(&self) -> bool {
        self.play.is_some()
    }
}

/// Apply `intent` to `state`
///
/// Returns `Ok(None)` when the intent is a no-op for this state, and an error
/// when its precondition is violated. The input state is never modified.
pub fn apply(state: &PlayerState, intent: Intent) -> Result<Option<Transition>> {
    match intent {
        Intent::PlayPlaylist { playlist, shuffle } => play_playlist(state, &playlist, shuffle),
        Intent::ClickTrack(track) => Ok(click_track(state, track)),
        Intent::ClickQueuedTrack(index) => click_queued_track(state, index).map(Some),
        Intent::SkipForward => Ok(advance(state, false)),
        Intent::SkipBackward => Ok(skip_backward(state)),
        Intent::ReorderQueue { from, to } => {
            let mut next = state.clone();
            next.queued_tracks.reorder(from, to)?;
            if from == to {
                return Ok(None);
            }
            Ok(Some(Transition::local(state, next)))
        }
        Intent::ToggleShuffle => {
            let mut next = state.clone();
            next.shuffle = !state.shuffle;
            if next.shuffle && state.from_playlist.is_some() {
                next.queued_tracks.shuffle();
            }
            Ok(Some(Transition::local(state, next)))
        }
        Intent::TrackEnded => Ok(track_ended(state)),
        Intent::Seek(position) => seek(state, position).map(Some),
        Intent::TogglePlayPause => {
            if state.current_track.is_none() {
                return Err(PlayerError::NoTrackLoaded);
            }
            let mut next = state.clone();
            if state.is_playing {
                next.is_playing = false;
                return Ok(Some(Transition::local(state, next)));
            }
            Ok(Some(resume(state, next)))
        }
        Intent::SetRepeat(mode) => {
            if state.repeat == mode {
                return Ok(None);
            }
            let mut next = state.clone();
            next.repeat = mode;
            Ok(Some(Transition::local(state, next)))
        }
        Intent::Enqueue(track) => {
            let mut next = state.clone();
            next.queued_tracks.add_to_end(track);
            Ok(Some(Transition::local(state, next)))
        }
        Intent::TimeUpdate(position) => {
            // Samples only count while playing; a paused element may still
            // report its last position
            if !state.is_playing || state.current_track.is_none() {
                return Ok(None);
            }
            let mut next = state.clone();
            next.current_time = position;
            Ok(Some(Transition::local(state, next)))
        }
        Intent::DurationLoaded(duration) => {
            if state.current_track.is_none() || !duration.is_finite() || duration <= 0.0 {
                return Ok(None);
            }
            let mut next = state.clone();
            next.duration = duration;
            Ok(Some(Transition::local(state, next)))
        }
        Intent::MediaFailed(failure) => {
            let Some(track) = &state.current_track else {
                return Ok(None);
            };
            let alert = Alert::error(failure.describe(&track.name));
            let mut next = state.clone();
            next.is_playing = false;
            Ok(Some(
                Transition::local(state, next).followed_by(PlayerEvent::Alert(alert)),
            ))
        }
    }
}

fn play_playlist(
    state: &PlayerState,
    playlist: &Playlist,
    shuffle: bool,
) -> Result<Option<Transition>> {
    if playlist.tracks.is_empty() {
        return Err(PlayerError::EmptyPlaylist);
    }

    if state.is_from_playlist(playlist.id()) && state.current_track.is_some() {
        let mut next = state.clone();
        if state.is_playing {
            next.is_playing = false;
        } else {
            // Resume: pick up playlist tracks that are neither queued,
            // played, nor current
            let mut merged: Vec<Track> = playlist
                .tracks
                .iter()
                .filter(|t| {
                    !state.queued_tracks.contains(&t.id)
                        && !state.previous_tracks.contains(&t.id)
                        && state.current_track_id() != Some(t.id.as_str())
                })
                .cloned()
                .collect();
            if shuffle {
                shuffle_tracks(&mut merged);
            }
            next.queued_tracks.extend(merged);
            return Ok(Some(resume(state, next)));
        }
        return Ok(Some(Transition::local(state, next)));
    }

    let skip = outgoing_skip(state);

    let mut tracks = playlist.tracks.clone();
    if shuffle {
        shuffle_tracks(&mut tracks);
    }
    let mut queue: Queue = tracks.into_iter().collect();
    let first = queue.pop_next().ok_or(PlayerError::EmptyPlaylist)?;

    let mut next = PlayerState {
        queued_tracks: queue,
        previous_tracks: History::new(),
        repeat: RepeatMode::Off,
        shuffle,
        from_playlist: Some(playlist.to_ref()),
        ..PlayerState::new()
    };
    switch_to(&mut next, first);

    Ok(Some(Transition::session(state, next, skip)))
}

fn click_track(state: &PlayerState, track: Track) -> Option<Transition> {
    if state.current_track_id() == Some(track.id.as_str()) {
        return None;
    }

    let mut next = state.clone();
    next.previous_tracks.clear();
    next.from_playlist = None;
    next.shuffle = false;
    next.repeat = RepeatMode::Off;
    switch_to(&mut next, track);

    Some(Transition::session(state, next, outgoing_skip(state)))
}

fn click_queued_track(state: &PlayerState, index: usize) -> Result<Transition> {
    let mut next = state.clone();
    let (skipped, target) = next
        .queued_tracks
        .skip_to_index(index)
        .ok_or(PlayerError::IndexOutOfBounds(index))?;

    if let Some(current) = next.current_track.take() {
        next.previous_tracks.push(current);
    }
    next.previous_tracks.extend(skipped);
    next.from_playlist = None;
    switch_to(&mut next, target);

    Ok(Transition::session(state, next, outgoing_skip(state)))
}

/// Move to the next queued track
///
/// `natural` marks a completed track: it goes to history without a skip
/// report.
fn advance(state: &PlayerState, natural: bool) -> Option<Transition> {
    let mut next = state.clone();

    if next.queued_tracks.is_empty() && next.repeat == RepeatMode::All {
        let recycled = next.previous_tracks.take_all();
        next.queued_tracks.extend(recycled);
    }

    let upcoming = next.queued_tracks.pop_next()?;
    if let Some(current) = next.current_track.take() {
        next.previous_tracks.push(current);
    }
    switch_to(&mut next, upcoming);

    let skip = if natural { None } else { outgoing_skip(state) };
    Some(Transition::session(state, next, skip))
}

fn track_ended(state: &PlayerState) -> Option<Transition> {
    let finished = state.current_track.as_ref()?;
    let finished_event = PlayerEvent::TrackFinished {
        track_id: finished.id.clone(),
    };

    if state.repeat != RepeatMode::One {
        if let Some(transition) = advance(state, true) {
            return Some(transition.preceded_by(finished_event));
        }
    }

    if matches!(state.repeat, RepeatMode::One | RepeatMode::All) {
        // Loop the current track as a new listen
        let mut next = state.clone();
        next.current_time = 0.0;
        next.is_playing = true;
        next.play_id = None;
        return Some(
            Transition::session(state, next, None)
                .preceded_by(finished_event)
                .followed_by(PlayerEvent::SeekRequested { position: 0.0 }),
        );
    }

    // Nothing left: park at the end of the finished track
    let mut next = state.clone();
    next.is_playing = false;
    Some(Transition::local(state, next).preceded_by(finished_event))
}

fn skip_backward(state: &PlayerState) -> Option<Transition> {
    let current = state.current_track.as_ref()?;

    if state.current_time > RESTART_THRESHOLD_SECS || state.previous_tracks.is_empty() {
        return Some(restart(state));
    }

    let mut next = state.clone();
    let previous = next.previous_tracks.pop()?;
    next.queued_tracks.add_next(current.clone());
    switch_to(&mut next, previous);

    Some(Transition::session(state, next, outgoing_skip(state)))
}

/// Start playing again, from the top when parked at the end of the track
fn resume(state: &PlayerState, mut next: PlayerState) -> Transition {
    next.is_playing = true;
    if state.duration > 0.0 && state.current_time >= state.duration {
        next.current_time = 0.0;
        return Transition::local(state, next)
            .followed_by(PlayerEvent::SeekRequested { position: 0.0 });
    }
    Transition::local(state, next)
}

/// Restart the current track within the same play session
fn restart(state: &PlayerState) -> Transition {
    let mut next = state.clone();
    next.current_time = 0.0;
    Transition::local(state, next).followed_by(PlayerEvent::SeekRequested { position: 0.0 })
}

fn seek(state: &PlayerState, position: f64) -> Result<Transition> {
    if state.current_track.is_none() {
        return Err(PlayerError::NoTrackLoaded);
    }
    let beyond_end = state.duration > 0.0 && position > state.duration;
    if !position.is_finite() || position < 0.0 || beyond_end {
        return Err(PlayerError::InvalidSeekPosition(position));
    }

    let mut next = state.clone();
    next.current_time = position;
    Ok(Transition::local(state, next).followed_by(PlayerEvent::SeekRequested { position }))
}

/// Skip record for the current track, if the backend ever confirmed it
fn outgoing_skip(state: &PlayerState) -> Option<SkipReport> {
    state.current_track.as_ref()?;
    state.play_id.as_ref().map(|play_id| SkipReport {
        play_id: play_id.clone(),
        position: state.current_time,
    })
}

/// Load `track` as the current track from its start
fn switch_to(next: &mut PlayerState, track: Track) {
    next.duration = track.duration_secs();
    next.current_track = Some(track);
    next.current_time = 0.0;
    next.is_playing = true;
    next.play_id = None;
}

fn diff_events(prev: &PlayerState, next: &PlayerState, new_session: bool) -> Vec<PlayerEvent> {
    let mut events = Vec::new();

    if new_session {
        if let Some(track_id) = next.current_track_id() {
            events.push(PlayerEvent::TrackChanged {
                track_id: track_id.to_string(),
                previous_track_id: prev.current_track_id().map(str::to_string),
            });
        }
    }

    if prev.transport() != next.transport() {
        events.push(PlayerEvent::StateChanged {
            state: next.transport(),
        });
    }

    if prev.queued_tracks != next.queued_tracks {
        events.push(PlayerEvent::QueueChanged {
            length: next.queued_tracks.len(),
        });
    }

    events
}
