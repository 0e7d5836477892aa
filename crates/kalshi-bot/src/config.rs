//! Application configuration.
//!
//! Settings come from a TOML file with per-field defaults. Credentials are
//! env-only (`KALSHI_API_KEY`, `KALSHI_PRIVATE_KEY`) so they never land in
//! a config file, and the execution toggle can be flipped from the
//! environment as well.

use crate::error::{AppError, AppResult};
use kalshi_detector::DetectorConfig;
use kalshi_ws::ConnectionConfig;
use serde::Deserialize;
use std::path::Path;

/// Environment variable holding the API key id.
pub const ENV_API_KEY: &str = "KALSHI_API_KEY";
/// Environment variable holding the RSA private key PEM.
pub const ENV_PRIVATE_KEY: &str = "KALSHI_PRIVATE_KEY";
/// Environment override for [`AppConfig::auto_execute`].
pub const ENV_AUTO_EXECUTE: &str = "AUTO_EXECUTE";

/// WebSocket reconnect settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WsConfig {
    /// Base delay for reconnection backoff (ms).
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for reconnection backoff (ms).
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
}

fn default_reconnect_base_delay_ms() -> u64 {
    1000
}

fn default_reconnect_max_delay_ms() -> u64 {
    60000
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// WebSocket endpoint URL.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// REST API base URL.
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    /// Events fetched from the registry during selection.
    #[serde(default = "default_event_pool")]
    pub event_pool: usize,
    /// Events kept after ranking by 24h volume.
    #[serde(default = "default_top_events")]
    pub top_events: usize,
    /// Markets bootstrapped and subscribed per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between batches (ms).
    #[serde(default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,
    /// Interval between status log lines (s).
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,
    /// Cooldown between alerts for the same key (s).
    #[serde(default = "default_alert_cooldown_secs")]
    pub alert_cooldown_secs: u64,
    /// Whether detected opportunities invoke the execution hook.
    #[serde(default)]
    pub auto_execute: bool,
    /// WebSocket reconnect settings.
    #[serde(default)]
    pub websocket: WsConfig,
    /// Detector settings.
    #[serde(default)]
    pub detector: DetectorConfig,
}

fn default_ws_url() -> String {
    "wss://api.elections.kalshi.com/trade-api/ws/v2".to_string()
}

fn default_rest_url() -> String {
    "https://api.elections.kalshi.com/trade-api/v2".to_string()
}

fn default_event_pool() -> usize {
    200
}

fn default_top_events() -> usize {
    20
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_pause_ms() -> u64 {
    500
}

fn default_status_interval_secs() -> u64 {
    60
}

fn default_alert_cooldown_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            rest_url: default_rest_url(),
            event_pool: default_event_pool(),
            top_events: default_top_events(),
            batch_size: default_batch_size(),
            batch_pause_ms: default_batch_pause_ms(),
            status_interval_secs: default_status_interval_secs(),
            alert_cooldown_secs: default_alert_cooldown_secs(),
            auto_execute: false,
            websocket: WsConfig::default(),
            detector: DetectorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a file if it exists, otherwise fall back to defaults.
    /// Environment overrides apply either way.
    pub fn load(path: &str) -> AppResult<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(ENV_AUTO_EXECUTE) {
            self.auto_execute = matches!(value.as_str(), "1" | "true" | "yes");
        }
    }

    /// Stream connection settings for this config.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            url: self.ws_url.clone(),
            reconnect_base_delay_ms: self.websocket.reconnect_base_delay_ms,
            reconnect_max_delay_ms: self.websocket.reconnect_max_delay_ms,
        }
    }
}

/// API credentials, read from the environment only.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub private_key: String,
}

impl Credentials {
    pub fn from_env() -> AppResult<Self> {
        let api_key = std::env::var(ENV_API_KEY)
            .map_err(|_| AppError::Credentials(format!("{ENV_API_KEY} not set")))?;
        let private_key = std::env::var(ENV_PRIVATE_KEY)
            .map_err(|_| AppError::Credentials(format!("{ENV_PRIVATE_KEY} not set")))?;
        Ok(Self {
            api_key,
            private_key,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}
