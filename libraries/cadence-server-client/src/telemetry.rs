//! Listening telemetry endpoints.

use crate::client::{read_ack, read_json, CadenceClient};
use crate::error::Result;
use crate::types::{PlayResponse, SkipRequest};
use async_trait::async_trait;
use cadence_player::{PlayId, PlayerError, TelemetryBackend};
use tracing::debug;

impl CadenceClient {
    /// Open a play session for a track.
    pub async fn record_play(&self, track_id: &str) -> Result<PlayId> {
        let url = self.endpoint(&["record", "play", track_id])?;
        debug!(url = %url, "Recording play");

        let response = self.send(self.http().post(url)).await?;
        let play: PlayResponse = read_json(response, "play session").await?;
        Ok(PlayId::new(play.play_id))
    }

    /// Mark a play session as skipped at `position` seconds.
    pub async fn record_skip(&self, play_id: &PlayId, position: f64) -> Result<()> {
        let url = self.endpoint(&["record", "skip", play_id.as_str()])?;
        let body = SkipRequest::at(position);
        debug!(url = %url, skipped_at = body.skipped_at, "Recording skip");

        let response = self.send(self.http().post(url).json(&body)).await?;
        read_ack(response).await
    }
}

#[async_trait]
impl TelemetryBackend for CadenceClient {
    async fn record_play(&self, track_id: &str) -> cadence_player::Result<PlayId> {
        CadenceClient::record_play(self, track_id)
            .await
            .map_err(|e| PlayerError::Backend(e.to_string()))
    }

    async fn record_skip(&self, play_id: &PlayId, skipped_at: f64) -> cadence_player::Result<()> {
        CadenceClient::record_skip(self, play_id, skipped_at)
            .await
            .map_err(|e| PlayerError::Backend(e.to_string()))
    }
}
