/// Console configuration
use crate::error::{ConsoleError, Result};
use cadence_player::PlayerConfig;
use cadence_server_client::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_telemetry")]
    pub telemetry: TelemetrySettings,

    #[serde(default = "default_player")]
    pub player: PlayerSettings,

    #[serde(default = "default_logging")]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetrySettings {
    /// Bound on a single play or skip report
    #[serde(default = "default_report_timeout_secs")]
    pub report_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerSettings {
    /// Period of the simulated media clock
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl ConsoleConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `cadence.toml` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from("cadence.toml");
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (CADENCE_SERVER__URL, ...)
        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Self::from_builder(settings)
    }

    pub(crate) fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let config = builder
            .build()
            .map_err(|e| ConsoleError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ConsoleError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.url.trim().is_empty() {
            return Err(ConsoleError::Config(
                "Server URL is required (set CADENCE_SERVER__URL)".to_string(),
            ));
        }

        let timeouts = [
            ("server.request_timeout_secs", self.server.request_timeout_secs),
            ("server.connect_timeout_secs", self.server.connect_timeout_secs),
            ("telemetry.report_timeout_secs", self.telemetry.report_timeout_secs),
            ("player.tick_interval_ms", self.player.tick_interval_ms),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, value)| *value == 0) {
            return Err(ConsoleError::Config(format!("{} must be greater than zero", name)));
        }

        Ok(())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(self.server.url.clone()).with_timeouts(
            Duration::from_secs(self.server.request_timeout_secs),
            Duration::from_secs(self.server.connect_timeout_secs),
        )
    }

    pub fn player_config(&self) -> PlayerConfig {
        PlayerConfig {
            report_timeout: Duration::from_secs(self.telemetry.report_timeout_secs),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.player.tick_interval_ms)
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        url: default_url(),
        request_timeout_secs: default_request_timeout_secs(),
        connect_timeout_secs: default_connect_timeout_secs(),
    }
}

fn default_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_telemetry() -> TelemetrySettings {
    TelemetrySettings {
        report_timeout_secs: default_report_timeout_secs(),
    }
}

fn default_report_timeout_secs() -> u64 {
    10
}

fn default_player() -> PlayerSettings {
    PlayerSettings {
        tick_interval_ms: default_tick_interval_ms(),
    }
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_logging() -> LoggingSettings {
    LoggingSettings {
        filter: default_filter(),
    }
}

fn default_filter() -> String {
    "cadence_console=info,cadence_player=info,cadence_server_client=info".to_string()
}
