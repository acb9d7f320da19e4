//! Server-side download requests and playlist download progress.

use crate::client::{read_ack, CadenceClient};
use crate::error::{Result, ServerClientError};
use crate::types::{DownloadEventPayload, PlaylistDownloadEvent};
use futures_util::stream::{self, Stream, StreamExt};
use reqwest::header::ACCEPT;
use std::collections::VecDeque;
use tracing::{debug, info};

impl CadenceClient {
    /// Ask the server to fetch a track's audio if it does not have it yet.
    pub async fn request_download(&self, track_id: &str) -> Result<()> {
        let url = self.endpoint(&["download", track_id])?;
        debug!(url = %url, "Requesting track download");

        let response = self.send(self.http().post(url)).await?;
        read_ack(response).await?;

        info!(track_id, "Track download requested");
        Ok(())
    }

    /// Download every track of a playlist, following progress events.
    ///
    /// The stream yields [`PlaylistDownloadEvent::Started`] first, then one
    /// [`PlaylistDownloadEvent::Progress`] per track, and ends when the
    /// server closes the connection.
    pub async fn download_playlist(
        &self,
        playlist_id: &str,
    ) -> Result<impl Stream<Item = Result<PlaylistDownloadEvent>>> {
        let url = self.endpoint(&["download-playlist", playlist_id])?;
        debug!(url = %url, "Opening playlist download stream");

        let response = self
            .send(self.http().get(url).header(ACCEPT, "text/event-stream"))
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(download_events(Box::pin(response.bytes_stream())))
    }
}

/// Incremental decoder for `text/event-stream` bodies.
///
/// Only `data:` fields are kept; multi-line data is joined with `\n`.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: String,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed a chunk, returning the data of every event it completed.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut events = Vec::new();
        while let Some(end) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=end).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
            }
        }
        events
    }

    /// Flush an event left unterminated when the stream closed.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = rest.trim_end_matches(['\n', '\r']);
        if let Some(value) = rest.strip_prefix("data:") {
            self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        if self.data.is_empty() {
            return None;
        }
        let event = self.data.join("\n");
        self.data.clear();
        Some(event)
    }
}

fn parse_event(data: &str) -> Result<PlaylistDownloadEvent> {
    let payload: DownloadEventPayload = serde_json::from_str(data)
        .map_err(|e| ServerClientError::ParseError(format!("Bad download event {data:?}: {e}")))?;

    match (payload.num_tracks, payload.index) {
        (Some(num_tracks), _) => Ok(PlaylistDownloadEvent::Started { num_tracks }),
        (None, Some(index)) => Ok(PlaylistDownloadEvent::Progress {
            index,
            error: payload.error.filter(|e| !e.is_empty()),
        }),
        (None, None) => match payload.error.filter(|e| !e.is_empty()) {
            Some(message) => Err(ServerClientError::Api(message)),
            None => Err(ServerClientError::ParseError(format!(
                "Download event without num_tracks or index: {data}"
            ))),
        },
    }
}

struct EventState<S> {
    body: S,
    decoder: SseDecoder,
    ready: VecDeque<String>,
    started: bool,
    done: bool,
}

/// Turn a byte stream into download progress events.
pub(crate) fn download_events<S, B, E>(body: S) -> impl Stream<Item = Result<PlaylistDownloadEvent>>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<ServerClientError>,
{
    let state = EventState {
        body,
        decoder: SseDecoder::default(),
        ready: VecDeque::new(),
        started: false,
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(data) = state.ready.pop_front() {
                let event = parse_event(&data);
                if matches!(event, Ok(PlaylistDownloadEvent::Started { .. })) {
                    state.started = true;
                }
                return Some((event, state));
            }
            if state.done {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(chunk.as_ref());
                    state.ready.extend(events);
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e.into()), state));
                }
                None => {
                    state.done = true;
                    state.ready.extend(state.decoder.finish());
                    if state.ready.is_empty() && !state.started {
                        return Some((Err(ServerClientError::StreamClosed), state));
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&str]) -> impl Stream<Item = std::result::Result<Vec<u8>, ServerClientError>> + Unpin {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(p.as_bytes().to_vec()))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn decoder_splits_events_across_chunks() {
        let mut decoder = SseDecoder::default();

        assert!(decoder.push(b"data: {\"num_").is_empty());
        let events = decoder.push(b"tracks\": 2}\n\ndata: {\"index\": 0}\r\n\r\n: ping\n\n");
        assert_eq!(events, vec!["{\"num_tracks\": 2}", "{\"index\": 0}"]);
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn decoder_flushes_unterminated_event() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"event: progress\ndata: {\"index\": 3}").is_empty());
        assert_eq!(decoder.finish(), Some("{\"index\": 3}".to_string()));
    }

    #[test]
    fn parse_event_kinds() {
        assert_eq!(
            parse_event(r#"{"num_tracks": 4}"#).unwrap(),
            PlaylistDownloadEvent::Started { num_tracks: 4 }
        );
        assert_eq!(
            parse_event(r#"{"index": 1, "error": ""}"#).unwrap(),
            PlaylistDownloadEvent::Progress {
                index: 1,
                error: None
            }
        );
        assert_eq!(
            parse_event(r#"{"index": 2, "error": "not found"}"#).unwrap(),
            PlaylistDownloadEvent::Progress {
                index: 2,
                error: Some("not found".to_string())
            }
        );
        assert!(matches!(
            parse_event(r#"{"error": "playlist missing"}"#),
            Err(ServerClientError::Api(_))
        ));
        assert!(parse_event("garbage").is_err());
    }

    #[tokio::test]
    async fn stream_yields_events_in_order() {
        let events: Vec<_> = download_events(chunks(&[
            "data: {\"num_tracks\": 2}\n\n",
            "data: {\"index\": 0}\n\ndata: {\"index\": 1, \"error\": \"timeout\"}\n\n",
        ]))
        .collect()
        .await;

        let events: Vec<PlaylistDownloadEvent> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(
            events,
            vec![
                PlaylistDownloadEvent::Started { num_tracks: 2 },
                PlaylistDownloadEvent::Progress {
                    index: 0,
                    error: None
                },
                PlaylistDownloadEvent::Progress {
                    index: 1,
                    error: Some("timeout".to_string())
                },
            ]
        );
    }

    #[tokio::test]
    async fn empty_stream_is_closed_error() {
        let events: Vec<_> = download_events(chunks(&[])).collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(ServerClientError::StreamClosed)));
    }
}
