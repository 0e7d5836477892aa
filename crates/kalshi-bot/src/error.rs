//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credentials: {0}")]
    Credentials(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<kalshi_ws::WsError>),

    #[error("Feed error: {0}")]
    Feed(#[from] kalshi_feed::FeedError),

    #[error("Registry error: {0}")]
    Registry(#[from] kalshi_registry::RegistryError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] kalshi_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<kalshi_ws::WsError> for AppError {
    fn from(e: kalshi_ws::WsError) -> Self {
        Self::WebSocket(Box::new(e))
    }
}

pub type AppResult<T> = Result<T, AppError>;
