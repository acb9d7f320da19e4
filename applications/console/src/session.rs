//! Interactive player session
//!
//! Reads commands from stdin, drives the [`PlayerStore`], and stands in for
//! the media element: a ticker advances the playhead while playing, track
//! changes load lyrics and check the stream, and store events are rendered
//! as they are drained.
//!
//! Intents are committed on the loop itself. The telemetry they owe runs on
//! spawned tasks, so a slow backend never holds up input or the clock.

use crate::command::{Command, Target, HELP};
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result};
use crate::view;
use cadence_player::{
    Intent, LyricsTracker, PendingReports, PlaybackControl, PlayerEvent, PlayerStore, Playlist,
    PlaylistHead, SessionOutcome, Track, TransportState,
};
use cadence_server_client::CadenceClient;
use std::io::{Stdout, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

pub struct Session<W = Stdout> {
    client: CadenceClient,
    store: Arc<PlayerStore>,
    /// Last playlist listing, for `playlist <n>`
    playlists: Vec<PlaylistHead>,
    /// Last shown track list (playlist or search results), for `play <n>`
    listed: Vec<Track>,
    lyrics: LyricsTracker,
    /// Telemetry still in flight
    reports: JoinSet<SessionOutcome>,
    tick: Duration,
    out: W,
}

impl Session<Stdout> {
    pub fn new(client: CadenceClient, config: &ConsoleConfig) -> Self {
        Self::with_output(client, config, std::io::stdout())
    }
}

impl<W: Write> Session<W> {
    pub fn with_output(client: CadenceClient, config: &ConsoleConfig, out: W) -> Self {
        let store = PlayerStore::new(Arc::new(client.clone()), config.player_config());
        Self {
            client,
            store: Arc::new(store),
            playlists: Vec::new(),
            listed: Vec::new(),
            lyrics: LyricsTracker::default(),
            reports: JoinSet::new(),
            tick: config.tick_interval(),
            out,
        }
    }

    pub fn store(&self) -> &Arc<PlayerStore> {
        &self.store
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Load the playlist listing
    ///
    /// The session cannot start without it, so errors are returned rather
    /// than printed.
    pub async fn start(&mut self) -> Result<()> {
        self.playlists = self.client.list_playlists().await?;
        info!(count = self.playlists.len(), "Session started");
        self.show_playlists()
    }

    /// Run until `quit`, end of input or Ctrl-C
    pub async fn run(mut self) -> Result<()> {
        self.start().await?;
        writeln!(self.out, "Type 'help' for commands")?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut ticker = time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<Command>() {
                        Ok(Command::Quit) => break,
                        Ok(command) => {
                            if let Err(e) = self.execute(command).await {
                                writeln!(self.out, "{e}")?;
                            }
                        }
                        Err(e) => writeln!(self.out, "{e}")?,
                    }
                }
                _ = ticker.tick() => self.advance_clock()?,
                Some(joined) = self.reports.join_next(), if !self.reports.is_empty() => {
                    log_report(joined);
                }
                _ = &mut ctrl_c => break,
            }
            self.render_events().await?;
        }

        // Outgoing skips still reach the backend
        self.settle().await?;
        info!("Session ended");
        Ok(())
    }

    /// Wait for in-flight telemetry and render what it produced
    pub async fn settle(&mut self) -> Result<()> {
        while let Some(joined) = self.reports.join_next().await {
            log_report(joined);
        }
        self.render_events().await
    }

    pub async fn execute(&mut self, command: Command) -> Result<()> {
        debug!(?command, "Executing command");

        match command {
            Command::Playlists => {
                self.playlists = self.client.list_playlists().await?;
                self.show_playlists()?;
            }
            Command::Show(target) => {
                let playlist = self.fetch_playlist(target).await?;
                writeln!(
                    self.out,
                    "{} ({} tracks, {})\n{}",
                    playlist.head.name,
                    playlist.tracks.len(),
                    view::format_time(playlist.total_duration() as f64),
                    view::numbered(&playlist.tracks, view::track_line)
                )?;
                self.listed = playlist.tracks;
            }
            Command::PlayPlaylist { target, shuffle } => {
                let playlist = self.fetch_playlist(target).await?;
                if playlist.tracks.is_empty() {
                    writeln!(self.out, "Playlist {} is empty", playlist.head.name)?;
                    return Ok(());
                }
                self.dispatch(Intent::PlayPlaylist { playlist, shuffle })?;
            }
            Command::Search(query) => {
                // A failed search reads as no results
                let tracks = self.client.search(&query).await.unwrap_or_else(|e| {
                    warn!(query = %query, error = %e, "Search failed");
                    Vec::new()
                });
                if tracks.is_empty() {
                    writeln!(self.out, "No results for '{query}'")?;
                } else {
                    writeln!(self.out, "{}", view::numbered(&tracks, view::track_line))?;
                }
                self.listed = tracks;
            }
            Command::Play(index) => {
                let track = self.listed_track(index)?;
                self.dispatch(Intent::ClickTrack(track))?;
            }
            Command::Add(index) => {
                let track = self.listed_track(index)?;
                writeln!(self.out, "Queued {}", track.name)?;
                self.dispatch(Intent::Enqueue(track))?;
            }
            Command::Download(index) => {
                let track = self.listed_track(index)?;
                self.client.request_download(&track.id).await?;
                writeln!(self.out, "Download requested for {}", track.name)?;
            }
            Command::Queue => {
                writeln!(self.out, "{}", view::queue_view(&self.store.snapshot()))?;
            }
            Command::Jump(index) => self.dispatch(Intent::ClickQueuedTrack(index))?,
            Command::Move { from, to } => self.dispatch(Intent::ReorderQueue { from, to })?,
            Command::Next => self.dispatch(Intent::SkipForward)?,
            Command::Previous => self.dispatch(Intent::SkipBackward)?,
            Command::Pause => self.dispatch(Intent::TogglePlayPause)?,
            Command::Seek(position) => self.store.seek(position)?,
            Command::Shuffle => {
                self.dispatch(Intent::ToggleShuffle)?;
                let on = self.store.snapshot().shuffle;
                writeln!(self.out, "Shuffle {}", if on { "on" } else { "off" })?;
            }
            Command::Repeat(mode) => {
                let mode = mode.unwrap_or_else(|| self.store.snapshot().repeat.cycle());
                self.dispatch(Intent::SetRepeat(mode))?;
                writeln!(self.out, "Repeat {mode:?}")?;
            }
            Command::Lyrics => {
                let text = view::lyrics_view(self.lyrics.lyrics(), self.lyrics.active());
                writeln!(self.out, "{text}")?;
            }
            Command::Line(index) => {
                let lyrics = self.lyrics.lyrics();
                if !lyrics.time_synced {
                    writeln!(self.out, "These lyrics have no timestamps")?;
                } else if !lyrics.seek_to_line(index, self.store.as_ref()) {
                    writeln!(self.out, "No lyric line {}", index + 1)?;
                }
            }
            Command::Status => {
                writeln!(self.out, "{}", view::status_line(&self.store.snapshot()))?;
            }
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => {}
        }
        Ok(())
    }

    /// Move the simulated playhead forward by one tick while playing
    pub fn advance_clock(&mut self) -> Result<()> {
        let state = self.store.snapshot();
        if !state.is_playing {
            return Ok(());
        }

        let mut position = state.current_time + self.tick.as_secs_f64();
        if state.duration > 0.0 {
            position = position.min(state.duration);
        }
        if let Some(pending) = self.store.commit_time_update(position)? {
            self.spawn_reports(pending);
        }
        self.follow_lyrics()
    }

    /// Render everything the store recorded, including events raised while
    /// rendering (an unplayable stream raises an alert)
    pub async fn render_events(&mut self) -> Result<()> {
        loop {
            let events = self.store.drain_events();
            if events.is_empty() {
                return Ok(());
            }
            for event in events {
                self.render(event).await?;
            }
        }
    }

    async fn render(&mut self, event: PlayerEvent) -> Result<()> {
        match event {
            PlayerEvent::TrackChanged { track_id, .. } => self.load_track(&track_id).await?,
            PlayerEvent::StateChanged { state } => {
                let label = match state {
                    TransportState::Playing => "Playing",
                    TransportState::Paused => "Paused",
                    TransportState::Stopped => "Stopped",
                };
                writeln!(self.out, "[{label}]")?;
            }
            PlayerEvent::SeekRequested { position } => {
                writeln!(self.out, "Seek to {}", view::format_time(position))?;
                self.follow_lyrics()?;
            }
            PlayerEvent::TrackFinished { track_id } => debug!(%track_id, "Track finished"),
            PlayerEvent::QueueChanged { length } => debug!(length, "Queue changed"),
            PlayerEvent::SessionStarted { track_id, play_id } => {
                debug!(%track_id, play_id = %play_id.as_str(), "Play session started");
            }
            PlayerEvent::Alert(alert) => writeln!(self.out, "{}", view::alert_line(&alert))?,
        }
        Ok(())
    }

    /// Load a new current track the way a media element would
    async fn load_track(&mut self, track_id: &str) -> Result<()> {
        let state = self.store.snapshot();
        let Some(track) = state.current_track.as_ref().filter(|t| t.id == track_id) else {
            // Superseded by a later change
            return Ok(());
        };

        writeln!(self.out, "Now playing: {}", view::track_line(track))?;
        self.lyrics = LyricsTracker::new(self.client.load_lyrics(track).await);

        match self.client.diagnose_stream(&track.id).await {
            Ok(None) => {
                self.store.on_duration_loaded(track.duration_secs())?;
            }
            Ok(Some(failure)) => {
                self.store.report_media_failure(failure)?;
            }
            Err(e) => warn!(track_id, error = %e, "Could not check stream"),
        }
        self.follow_lyrics()
    }

    fn follow_lyrics(&mut self) -> Result<()> {
        let time = self.store.snapshot().current_time;
        if let Some(Some(index)) = self.lyrics.update(time) {
            if let Some(line) = self.lyrics.lyrics().lines.get(index) {
                writeln!(self.out, "  ~ {}", line.text)?;
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, intent: Intent) -> Result<()> {
        let name = intent.name();
        let pending = self.store.commit(intent)?;
        debug!(intent = name, changed = pending.is_some(), "Dispatched");
        if let Some(pending) = pending {
            self.spawn_reports(pending);
        }
        Ok(())
    }

    fn spawn_reports(&mut self, pending: PendingReports) {
        if pending.is_empty() {
            return;
        }
        let store = Arc::clone(&self.store);
        self.reports.spawn(async move { store.report(pending).await });
    }

    async fn fetch_playlist(&mut self, target: Target) -> Result<Playlist> {
        let id = match target {
            Target::Id(id) => id,
            Target::Index(index) => {
                if self.playlists.is_empty() {
                    self.playlists = self.client.list_playlists().await?;
                }
                self.playlists
                    .get(index)
                    .map(|p| p.id.clone())
                    .ok_or_else(|| ConsoleError::Command(format!("no playlist {}", index + 1)))?
            }
        };
        Ok(self.client.get_playlist(&id).await?)
    }

    fn listed_track(&self, index: usize) -> Result<Track> {
        self.listed.get(index).cloned().ok_or_else(|| {
            ConsoleError::Command(format!(
                "no track {} (use 'search' or 'show' first)",
                index + 1
            ))
        })
    }

    fn show_playlists(&mut self) -> Result<()> {
        if self.playlists.is_empty() {
            writeln!(self.out, "No playlists")?;
        } else {
            writeln!(
                self.out,
                "Playlists:\n{}",
                view::numbered(&self.playlists, view::playlist_line)
            )?;
        }
        Ok(())
    }
}

fn log_report(joined: std::result::Result<SessionOutcome, JoinError>) {
    match joined {
        Ok(session) => debug!(?session, "Reports sent"),
        Err(e) => warn!(error = %e, "Report task failed"),
    }
}
