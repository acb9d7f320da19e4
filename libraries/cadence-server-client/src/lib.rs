//! Cadence Server Client
//!
//! HTTP client library for the Cadence music server API.
//!
//! # Features
//!
//! - **Library**: List and fetch playlists, search tracks, stream URLs
//! - **Lyrics**: Fetch and parse timestamped lyrics
//! - **Telemetry**: Record plays and skips (implements the player's
//!   `TelemetryBackend`)
//! - **Download**: Request track downloads, follow playlist download progress
//! - **Diagnostics**: Classify why a stream failed to load
//!
//! # Example
//!
//! ```ignore
//! use cadence_server_client::{CadenceClient, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CadenceClient::new(ServerConfig::new("http://localhost:8080/api/v1"))?;
//!
//!     let playlists = client.list_playlists().await?;
//!     println!("Found {} playlists", playlists.len());
//!
//!     let results = client.search("daft punk").await?;
//!     for track in results {
//!         println!("{} - {}", track.artist_line(), track.name);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod download;
mod error;
mod library;
mod telemetry;
mod types;

// Re-export main types
pub use client::CadenceClient;
pub use error::{Result, ServerClientError};
pub use types::{LyricsResponse, PlayResponse, PlaylistDownloadEvent, ServerConfig, SkipRequest};
