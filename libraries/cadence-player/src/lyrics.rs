//! Lyrics synchronization
//!
//! Parses `[MM:SS.ff]text` lyrics and follows the playhead to find the line
//! currently sung. Lyrics without usable timestamps are kept as plain text
//! and never highlighted.

use crate::control::PlaybackControl;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

static TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d{2,}):(\d{2})\.(\d{2,3})\]\s*(.*)").unwrap());

/// A single lyric line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Start time in seconds
    pub time: f64,
    pub text: String,
}

/// Parsed lyrics for one track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lyrics {
    /// Lines in input order (not re-sorted by time)
    pub lines: Vec<LyricLine>,
    /// Whether line times come from real timestamps
    pub time_synced: bool,
}

impl Lyrics {
    /// Parse a lyrics blob for a track lasting `duration` seconds
    pub fn parse(raw: &str, duration: f64) -> Self {
        let rows: Vec<&str> = raw
            .split('\n')
            .map(|row| row.trim_end_matches('\r'))
            .collect();

        if raw.trim().is_empty() {
            return Self::default();
        }

        let lines: Vec<LyricLine> = rows.iter().filter_map(|row| parse_timed(row)).collect();
        if !lines.is_empty() {
            return Self {
                lines,
                time_synced: true,
            };
        }

        // No timestamps. Text from the first bracketed row onward is spread
        // evenly over the track.
        if let Some(start) = rows.iter().position(|row| row.starts_with('[')) {
            let untimed = &rows[start..];
            let step = duration / untimed.len() as f64;
            debug!(lines = untimed.len(), "Lyrics have no usable timestamps");
            return Self {
                lines: untimed
                    .iter()
                    .enumerate()
                    .map(|(i, row)| LyricLine {
                        time: step * i as f64,
                        text: (*row).to_string(),
                    })
                    .collect(),
                time_synced: false,
            };
        }

        Self {
            lines: rows
                .iter()
                .map(|row| LyricLine {
                    time: 0.0,
                    text: (*row).to_string(),
                })
                .collect(),
            time_synced: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the line active at `time`
    ///
    /// The last line (in input order) starting at or before `time`. Always
    /// `None` for untimed lyrics.
    pub fn active_index(&self, time: f64) -> Option<usize> {
        if !self.time_synced {
            return None;
        }
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.time <= time)
            .map(|(i, _)| i)
            .last()
    }

    /// Seek to the start of line `index`
    ///
    /// Returns whether a seek was issued. Untimed lyrics never seek.
    pub fn seek_to_line(&self, index: usize, control: &dyn PlaybackControl) -> bool {
        if !self.time_synced {
            return false;
        }
        let Some(line) = self.lines.get(index) else {
            return false;
        };
        match control.seek(line.time) {
            Ok(()) => true,
            Err(e) => {
                warn!(line = index, error = %e, "Failed to seek to lyric line");
                false
            }
        }
    }
}

fn parse_timed(row: &str) -> Option<LyricLine> {
    let caps = TIMESTAMP.captures(row)?;
    let minutes: f64 = caps[1].parse().ok()?;
    let seconds: f64 = caps[2].parse().ok()?;
    let fraction = &caps[3];
    let divisor = if fraction.len() == 3 { 1000.0 } else { 100.0 };
    let fraction: f64 = fraction.parse().ok()?;

    Some(LyricLine {
        time: minutes * 60.0 + seconds + fraction / divisor,
        text: caps[4].to_string(),
    })
}

/// Follows the playhead and reports when the active line changes
#[derive(Debug, Clone, Default)]
pub struct LyricsTracker {
    lyrics: Lyrics,
    active: Option<usize>,
}

impl LyricsTracker {
    pub fn new(lyrics: Lyrics) -> Self {
        Self {
            lyrics,
            active: None,
        }
    }

    pub fn lyrics(&self) -> &Lyrics {
        &self.lyrics
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Re-evaluate at `time`; returns the new active index when it changed
    pub fn update(&mut self, time: f64) -> Option<Option<usize>> {
        let active = self.lyrics.active_index(time);
        if active == self.active {
            return None;
        }
        self.active = active;
        Some(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PlayerError, Result};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingControl {
        seeks: RefCell<Vec<f64>>,
    }

    impl PlaybackControl for RecordingControl {
        fn seek(&self, position: f64) -> Result<()> {
            self.seeks.borrow_mut().push(position);
            Ok(())
        }
    }

    struct FailingControl;

    impl PlaybackControl for FailingControl {
        fn seek(&self, _position: f64) -> Result<()> {
            Err(PlayerError::NoTrackLoaded)
        }
    }

    #[test]
    fn parses_centiseconds() {
        let lyrics = Lyrics::parse("[00:01.50]hello\n[00:03.00]world", 10.0);

        assert!(lyrics.time_synced);
        assert_eq!(
            lyrics.lines,
            vec![
                LyricLine {
                    time: 1.5,
                    text: "hello".to_string()
                },
                LyricLine {
                    time: 3.0,
                    text: "world".to_string()
                },
            ]
        );
    }

    #[test]
    fn parses_milliseconds_and_minutes() {
        let lyrics = Lyrics::parse("[01:02.250] first\r\n[02:00.005]second", 200.0);
        assert!(lyrics.time_synced);
        assert_eq!(lyrics.lines[0].time, 62.25);
        assert_eq!(lyrics.lines[0].text, "first");
        assert!((lyrics.lines[1].time - 120.005).abs() < 1e-9);
    }

    #[test]
    fn skips_rows_without_timestamps() {
        let lyrics = Lyrics::parse("[ti:Title]\n[00:05.00]one\n\n[00:07.00]two", 10.0);
        assert!(lyrics.time_synced);
        assert_eq!(lyrics.lines.len(), 2);
    }

    #[test]
    fn keeps_input_order() {
        let lyrics = Lyrics::parse("[00:09.00]late\n[00:01.00]early", 10.0);
        assert_eq!(lyrics.lines[0].text, "late");
        assert_eq!(lyrics.lines[1].text, "early");
    }

    #[test]
    fn bracketed_untimed_lines_are_spread() {
        let lyrics = Lyrics::parse("intro\n[verse]\nla\nla la\nend", 40.0);

        assert!(!lyrics.time_synced);
        let times: Vec<f64> = lyrics.lines.iter().map(|l| l.time).collect();
        assert_eq!(times, vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(lyrics.lines[0].text, "[verse]");
    }

    #[test]
    fn plain_text_lines_at_zero() {
        let lyrics = Lyrics::parse("just\nwords", 100.0);
        assert!(!lyrics.time_synced);
        assert_eq!(lyrics.lines.len(), 2);
        assert!(lyrics.lines.iter().all(|l| l.time == 0.0));
    }

    #[test]
    fn empty_input() {
        assert!(Lyrics::parse("", 100.0).is_empty());
        assert!(Lyrics::parse("  \n ", 100.0).is_empty());
    }

    #[test]
    fn active_index_is_last_started_line() {
        let lyrics = Lyrics::parse("[00:01.50]hello\n[00:03.00]world", 10.0);

        assert_eq!(lyrics.active_index(0.5), None);
        assert_eq!(lyrics.active_index(1.5), Some(0));
        assert_eq!(lyrics.active_index(2.9), Some(0));
        assert_eq!(lyrics.active_index(3.0), Some(1));
        assert_eq!(lyrics.active_index(9.0), Some(1));
    }

    #[test]
    fn untimed_lyrics_never_highlight_or_seek() {
        let lyrics = Lyrics::parse("just\nwords", 100.0);
        let control = RecordingControl::default();

        assert_eq!(lyrics.active_index(50.0), None);
        assert!(!lyrics.seek_to_line(1, &control));
        assert!(control.seeks.borrow().is_empty());
    }

    #[test]
    fn clicking_line_seeks() {
        let lyrics = Lyrics::parse("[00:01.50]hello\n[00:03.00]world", 10.0);
        let control = RecordingControl::default();

        assert!(lyrics.seek_to_line(1, &control));
        assert!(!lyrics.seek_to_line(5, &control));
        assert_eq!(*control.seeks.borrow(), vec![3.0]);

        assert!(!lyrics.seek_to_line(0, &FailingControl));
    }

    #[test]
    fn tracker_reports_changes_only() {
        let mut tracker =
            LyricsTracker::new(Lyrics::parse("[00:01.00]a\n[00:02.00]b", 10.0));

        assert_eq!(tracker.update(0.5), None);
        assert_eq!(tracker.update(1.0), Some(Some(0)));
        assert_eq!(tracker.update(1.5), None);
        assert_eq!(tracker.update(2.5), Some(Some(1)));
        // Seeking back before the first line clears the highlight
        assert_eq!(tracker.update(0.0), Some(None));
        assert_eq!(tracker.active(), None);
    }
}
