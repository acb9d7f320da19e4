//! Listening telemetry
//!
//! The player reports two things to the backend: a play session opening for
//! each track that becomes current, and a skip for each track abandoned
//! before completion. Transport is provided by the platform through
//! [`TelemetryBackend`].

use crate::engine::SkipReport;
use crate::error::{PlayerError, Result};
use crate::types::PlayId;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Backend that records listening sessions
#[async_trait]
pub trait TelemetryBackend: Send + Sync {
    /// Open a play session for a track, returning its id
    async fn record_play(&self, track_id: &str) -> Result<PlayId>;

    /// Mark a play session as skipped at `skipped_at` seconds
    async fn record_skip(&self, play_id: &PlayId, skipped_at: f64) -> Result<()>;
}

/// Bounded wrapper around a [`TelemetryBackend`]
///
/// Each call is limited to `timeout`; an expired call becomes
/// [`PlayerError::Timeout`].
#[derive(Clone)]
pub struct TelemetryReporter {
    backend: Arc<dyn TelemetryBackend>,
    timeout: Duration,
}

impl TelemetryReporter {
    pub fn new(backend: Arc<dyn TelemetryBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Open a play session for `track_id`
    pub async fn report_play(&self, track_id: &str) -> Result<PlayId> {
        debug!(track_id, "Reporting play");

        match tokio::time::timeout(self.timeout, self.backend.record_play(track_id)).await {
            Ok(Ok(play_id)) => {
                debug!(track_id, play_id = %play_id, "Play session opened");
                Ok(play_id)
            }
            Ok(Err(e)) => {
                warn!(track_id, error = %e, "Failed to report play");
                Err(e)
            }
            Err(_) => {
                warn!(track_id, timeout = ?self.timeout, "Play report timed out");
                Err(PlayerError::Timeout(self.timeout))
            }
        }
    }

    /// Report the outgoing track as skipped
    pub async fn report_skip(&self, report: &SkipReport) -> Result<()> {
        debug!(play_id = %report.play_id, position = report.position, "Reporting skip");

        let call = self
            .backend
            .record_skip(&report.play_id, report.position);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!(play_id = %report.play_id, error = %e, "Failed to report skip");
                Err(e)
            }
            Err(_) => {
                warn!(play_id = %report.play_id, timeout = ?self.timeout, "Skip report timed out");
                Err(PlayerError::Timeout(self.timeout))
            }
        }
    }
}

impl std::fmt::Debug for TelemetryReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryReporter")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
