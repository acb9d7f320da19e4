//! Plain-text rendering of player state for the terminal

use cadence_player::{
    Alert, AlertLevel, Lyrics, PlayerState, PlaylistHead, RepeatMode, Track, TransportState,
};
use std::fmt::Write;

/// `m:ss`, or `h:mm:ss` past an hour
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

pub fn track_line(track: &Track) -> String {
    let artists = track.artist_line();
    let mut line = if artists.is_empty() {
        track.name.clone()
    } else {
        format!("{} - {}", artists, track.name)
    };
    let _ = write!(line, " ({})", format_time(track.duration_secs()));
    if track.downloaded == Some(false) {
        line.push_str(" [not downloaded]");
    }
    line
}

/// Numbered list, 1-based to match command positions
pub fn numbered<T>(items: &[T], render: impl Fn(&T) -> String) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{:>3}. {}", i + 1, render(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn playlist_line(playlist: &PlaylistHead) -> String {
    if playlist.description.is_empty() {
        playlist.name.clone()
    } else {
        format!("{} - {}", playlist.name, playlist.description)
    }
}

pub fn status_line(state: &PlayerState) -> String {
    let Some(track) = &state.current_track else {
        return "Nothing playing".to_string();
    };

    let marker = match state.transport() {
        TransportState::Playing => ">",
        TransportState::Paused | TransportState::Stopped => "||",
    };
    let repeat = match state.repeat {
        RepeatMode::Off => "",
        RepeatMode::One => " [repeat one]",
        RepeatMode::All => " [repeat all]",
    };
    let shuffle = if state.shuffle { " [shuffle]" } else { "" };
    let source = state
        .from_playlist
        .as_ref()
        .map(|p| format!(" from {}", p.name))
        .unwrap_or_default();

    format!(
        "{} {} {} / {}{}{}{}",
        marker,
        track.name,
        format_time(state.current_time),
        format_time(state.duration),
        source,
        shuffle,
        repeat
    )
}

pub fn queue_view(state: &PlayerState) -> String {
    let mut out = String::new();
    if let Some(track) = &state.current_track {
        let _ = writeln!(out, "Now: {}", track_line(track));
    }
    if state.queued_tracks.is_empty() {
        out.push_str("Queue is empty");
    } else {
        let tracks: Vec<&Track> = state.queued_tracks.iter().collect();
        let _ = write!(out, "Up next:\n{}", numbered(&tracks, |t| track_line(t)));
    }
    out
}

pub fn lyrics_view(lyrics: &Lyrics, active: Option<usize>) -> String {
    if lyrics.is_empty() {
        return "No lyrics for this track".to_string();
    }
    lyrics
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let marker = if Some(i) == active { '>' } else { ' ' };
            if lyrics.time_synced {
                format!("{marker}{:>3}. [{}] {}", i + 1, format_time(line.time), line.text)
            } else {
                format!("{marker}{:>3}. {}", i + 1, line.text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn alert_line(alert: &Alert) -> String {
    match alert.level {
        AlertLevel::Warning => format!("! {}", alert.message),
        AlertLevel::Error => format!("!! {}", alert.message),
    }
}
