/// Interactive command parsing
use crate::error::{ConsoleError, Result};
use cadence_player::RepeatMode;
use std::str::FromStr;

/// Playlist reference typed by the user: a position in the last listing or
/// a playlist id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Index(usize),
    Id(String),
}

impl FromStr for Target {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self> {
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            parse_position(s).map(Target::Index)
        } else if s.is_empty() {
            Err(ConsoleError::Command("missing playlist".to_string()))
        } else {
            Ok(Target::Id(s.to_string()))
        }
    }
}

/// One line of user input
///
/// Positions are typed 1-based and stored 0-based.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// List playlists
    Playlists,
    /// Show a playlist's tracks
    Show(Target),
    /// Play (or pause/resume) a playlist
    PlayPlaylist { target: Target, shuffle: bool },
    Search(String),
    /// Play a listed track
    Play(usize),
    /// Append a listed track to the queue
    Add(usize),
    /// Ask the server to download a listed track
    Download(usize),
    Queue,
    /// Jump to a queued track
    Jump(usize),
    Move { from: usize, to: usize },
    Next,
    Previous,
    Pause,
    Seek(f64),
    Shuffle,
    /// Set a repeat mode, or cycle when none is given
    Repeat(Option<RepeatMode>),
    Lyrics,
    /// Seek to a lyric line
    Line(usize),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(ConsoleError::Command("empty command".to_string()));
        };
        let args: Vec<&str> = words.collect();

        let command = match (name.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("playlists" | "ls", []) => Command::Playlists,
            ("show", [target]) => Command::Show(target.parse()?),
            ("playlist" | "pl", [target]) => Command::PlayPlaylist {
                target: target.parse()?,
                shuffle: false,
            },
            ("playlist" | "pl", [target, "shuffle"]) => Command::PlayPlaylist {
                target: target.parse()?,
                shuffle: true,
            },
            ("search" | "s", [_, ..]) => Command::Search(args.join(" ")),
            ("play", [n]) => Command::Play(parse_position(n)?),
            ("add", [n]) => Command::Add(parse_position(n)?),
            ("download", [n]) => Command::Download(parse_position(n)?),
            ("queue" | "q", []) => Command::Queue,
            ("jump", [n]) => Command::Jump(parse_position(n)?),
            ("move", [from, to]) => Command::Move {
                from: parse_position(from)?,
                to: parse_position(to)?,
            },
            ("next" | "n", []) => Command::Next,
            ("prev" | "p", []) => Command::Previous,
            ("pause" | "resume", []) => Command::Pause,
            ("seek", [position]) => Command::Seek(parse_seconds(position)?),
            ("shuffle", []) => Command::Shuffle,
            ("repeat", []) => Command::Repeat(None),
            ("repeat", [mode]) => Command::Repeat(Some(parse_repeat(mode)?)),
            ("lyrics", []) => Command::Lyrics,
            ("line", [n]) => Command::Line(parse_position(n)?),
            ("status", []) => Command::Status,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            _ => {
                return Err(ConsoleError::Command(format!(
                    "unknown command '{}' (try 'help')",
                    line.trim()
                )))
            }
        };
        Ok(command)
    }
}

fn parse_position(s: &str) -> Result<usize> {
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ConsoleError::Command(format!(
            "'{}' is not a position (1, 2, ...)",
            s
        ))),
    }
}

/// Seconds, either plain (`75`, `75.5`) or `m:ss`
fn parse_seconds(s: &str) -> Result<f64> {
    let invalid = || ConsoleError::Command(format!("'{}' is not a time", s));

    let seconds = match s.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
            let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
            f64::from(minutes) * 60.0 + seconds
        }
        None => s.parse().map_err(|_| invalid())?,
    };
    if seconds.is_finite() {
        Ok(seconds)
    } else {
        Err(invalid())
    }
}

fn parse_repeat(s: &str) -> Result<RepeatMode> {
    match s.to_ascii_lowercase().as_str() {
        "off" => Ok(RepeatMode::Off),
        "one" => Ok(RepeatMode::One),
        "all" => Ok(RepeatMode::All),
        _ => Err(ConsoleError::Command(format!(
            "unknown repeat mode '{}' (off, one, all)",
            s
        ))),
    }
}

pub const HELP: &str = "\
Commands:
  playlists                 list playlists
  show <n|id>               show a playlist's tracks
  playlist <n|id> [shuffle] play a playlist (again to pause/resume)
  search <query>            search tracks
  play <n> | add <n>        play or enqueue a listed track
  download <n>              download a listed track on the server
  queue | jump <n>          show the queue, jump to a queued track
  move <from> <to>          reorder the queue
  next | prev | pause       transport
  seek <secs|m:ss>          seek in the current track
  shuffle | repeat [mode]   toggle shuffle, set or cycle repeat
  lyrics | line <n>         show lyrics, seek to a lyric line
  status | help | quit";
