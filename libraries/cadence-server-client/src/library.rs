//! Library browsing: playlists, search, streams and lyrics.

use crate::client::{envelope_error, read_json, CadenceClient};
use crate::error::{Result, ServerClientError};
use crate::types::LyricsResponse;
use cadence_player::{Lyrics, MediaFailure, Playlist, PlaylistHead, Track};
use reqwest::header::RANGE;
use tracing::{debug, warn};

impl CadenceClient {
    /// List all playlists.
    pub async fn list_playlists(&self) -> Result<Vec<PlaylistHead>> {
        let url = self.endpoint(&["playlists"])?;
        let playlists: Option<Vec<PlaylistHead>> = self.get_json(url, "playlists").await?;
        let playlists = playlists.unwrap_or_default();

        debug!(count = playlists.len(), "Fetched playlists");
        Ok(playlists)
    }

    /// Get a playlist with its tracks.
    pub async fn get_playlist(&self, playlist_id: &str) -> Result<Playlist> {
        let url = self.endpoint(&["playlists", playlist_id])?;
        let playlist: Playlist = self.get_json(url, "playlist").await?;

        debug!(
            playlist_id,
            tracks = playlist.tracks.len(),
            "Fetched playlist"
        );
        Ok(playlist)
    }

    /// Search the catalogue.
    ///
    /// An empty query is rejected without contacting the server.
    pub async fn search(&self, query: &str) -> Result<Vec<Track>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServerClientError::Api("search query is empty".into()));
        }

        let url = self.endpoint(&["search"])?;
        debug!(url = %url, query, "Searching");

        let response = self.send(self.http().get(url).query(&[("q", query)])).await?;
        let tracks: Option<Vec<Track>> = read_json(response, "search results").await?;
        Ok(tracks.unwrap_or_default())
    }

    /// Streamable audio URL for a track.
    pub fn stream_url(&self, track_id: &str) -> Result<String> {
        Ok(self.endpoint(&["play", track_id])?.to_string())
    }

    /// Raw lyrics text for a track.
    pub async fn lyrics(&self, track_id: &str) -> Result<String> {
        let url = self.endpoint(&["lyrics", track_id])?;
        let response: LyricsResponse = self.get_json(url, "lyrics").await?;
        Ok(response.lyrics)
    }

    /// Lyrics for a track, using inline lyrics when present.
    ///
    /// Fetch failures degrade to empty lyrics.
    pub async fn load_lyrics(&self, track: &Track) -> Lyrics {
        if let Some(raw) = track.lyrics.as_deref().filter(|raw| !raw.trim().is_empty()) {
            return Lyrics::parse(raw, track.duration_secs());
        }

        match self.lyrics(&track.id).await {
            Ok(raw) => Lyrics::parse(&raw, track.duration_secs()),
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "Failed to fetch lyrics");
                Lyrics::default()
            }
        }
    }

    /// Re-fetch a track's stream to find out why it failed to load.
    ///
    /// Returns `None` when the stream is reachable. Only the first byte is
    /// requested.
    pub async fn diagnose_stream(&self, track_id: &str) -> Result<Option<MediaFailure>> {
        let url = self.endpoint(&["play", track_id])?;
        debug!(url = %url, "Diagnosing stream");

        let response = self
            .send(self.http().get(url).header(RANGE, "bytes=0-0"))
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(None);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str(&body)
            .ok()
            .and_then(|value| envelope_error(&value));

        let failure = MediaFailure::from_status(status.as_u16(), message);
        warn!(track_id, status = status.as_u16(), ?failure, "Stream failed");
        Ok(Some(failure))
    }
}
