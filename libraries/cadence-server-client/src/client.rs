//! Main Cadence server client.

use crate::error::{Result, ServerClientError};
use crate::types::ServerConfig;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Client for the Cadence server API.
///
/// Covers playlist browsing, search, lyrics, listening telemetry and
/// downloads. Cheap to clone; clones share the connection pool.
///
/// # Example
///
/// ```ignore
/// use cadence_server_client::{CadenceClient, ServerConfig};
///
/// let client = CadenceClient::new(ServerConfig::new("http://localhost:8080/api/v1"))?;
///
/// for head in client.list_playlists().await? {
///     println!("{} ({})", head.name, head.id);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CadenceClient {
    http: Client,
    base_url: Url,
}

impl CadenceClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        // Validate URL
        if config.url.is_empty() {
            return Err(ServerClientError::InvalidUrl("URL cannot be empty".into()));
        }

        // Parse and normalize URL
        let url = config.url.trim_end_matches('/');
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ServerClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        let base_url =
            Url::parse(url).map_err(|e| ServerClientError::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(format!("Cadence/{} (Console)", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ServerClientError::Request)?;

        Ok(Self { http, base_url })
    }

    /// Get the API base URL.
    pub fn url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Build an endpoint URL from path segments (each segment is escaped).
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ServerClientError::InvalidUrl("URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Send a request, classifying connection failures.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ServerClientError::ServerUnreachable(e.to_string())
            } else {
                ServerClientError::Request(e)
            }
        })
    }

    /// GET an endpoint and decode its JSON payload.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        debug!(url = %url, "Fetching {}", what);
        let response = self.send(self.http.get(url)).await?;
        read_json(response, what).await
    }
}

/// Non-empty `error` field of an envelope, if any.
pub(crate) fn envelope_error(value: &Value) -> Option<String> {
    value
        .get("error")?
        .as_str()
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

/// Turn a non-success response body into an error.
fn status_error(status: u16, body: String) -> ServerClientError {
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| envelope_error(&value))
        .unwrap_or(body);
    ServerClientError::ServerError { status, message }
}

/// Decode a JSON response, honouring the `error` envelope.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(status_error(status.as_u16(), body));
    }

    let value: Value = serde_json::from_str(&body)
        .map_err(|e| ServerClientError::ParseError(format!("Failed to parse {}: {}", what, e)))?;
    if let Some(message) = envelope_error(&value) {
        return Err(ServerClientError::Api(message));
    }

    serde_json::from_value(value)
        .map_err(|e| ServerClientError::ParseError(format!("Failed to parse {}: {}", what, e)))
}

/// Check a response that carries no payload (`null`, empty, or `{}`).
pub(crate) async fn read_ack(response: Response) -> Result<()> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(status_error(status.as_u16(), body));
    }

    if let Ok(value) = serde_json::from_str::<Value>(&body) {
        if let Some(message) = envelope_error(&value) {
            return Err(ServerClientError::Api(message));
        }
    }
    Ok(())
}
