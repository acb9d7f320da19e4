//! Cadence Console
//!
//! Terminal front end for the Cadence music server: browse playlists, search,
//! control playback, follow lyrics and request downloads.
//!
//! This library exposes the session and its building blocks for testing.

pub mod command;
pub mod config;
pub mod error;
pub mod session;
pub mod view;

// Re-export commonly used types for convenience
pub use command::{Command, Target};
pub use config::ConsoleConfig;
pub use error::{ConsoleError, Result};
pub use session::Session;
