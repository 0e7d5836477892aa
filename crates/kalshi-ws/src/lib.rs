//! WebSocket client for the Kalshi trade API.
//!
//! Provides robust WebSocket connectivity with:
//! - Signed connection headers (RSA-PSS, HMAC fallback)
//! - Automatic reconnection with exponential backoff
//! - Per-channel subscription tracking with wire-level dedup
//! - Full subscription replay after reconnect
//! - Observer-based message routing

pub mod auth;
pub mod connection;
pub mod error;
pub mod message;
pub mod subscription;

pub use auth::AuthSigner;
pub use connection::{ConnectionConfig, ConnectionState, StreamConnection};
pub use error::{WsError, WsResult};
pub use message::{
    OrderbookDeltaPayload, StreamMessage, SubscribeCommand, TickerPayload, TradePayload,
    CHANNEL_ORDERBOOK_DELTA, CHANNEL_TICKER, CHANNEL_TRADE, HEARTBEAT_FRAME,
};
pub use subscription::{Observer, ObserverId, SubscriptionRegistry};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
