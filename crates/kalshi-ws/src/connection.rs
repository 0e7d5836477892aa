//! WebSocket connection manager.
//!
//! Handles the signed handshake, automatic reconnection with exponential
//! backoff, and full subscription replay after reconnection.

use crate::auth::AuthSigner;
use crate::error::{WsError, WsResult};
use crate::message::{StreamMessage, SubscribeCommand, HEARTBEAT_FRAME};
use crate::subscription::{Observer, SubscriptionRegistry};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex as TokioMutex};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket URL.
    pub url: String,
    /// Base delay for exponential backoff.
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    pub reconnect_max_delay_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "wss://api.elections.kalshi.com/trade-api/ws/v2".to_string(),
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 60000,
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// Terminal: reached only through [`StreamConnection::stop`].
    Stopped,
}

/// Authenticated stream connection with reconnect and replay.
pub struct StreamConnection {
    config: ConnectionConfig,
    signer: AuthSigner,
    state: Arc<RwLock<ConnectionState>>,
    registry: Arc<SubscriptionRegistry>,
    request_id: AtomicU64,
    /// Outbound text sender (used by `subscribe` while connected).
    outbound_tx: mpsc::Sender<String>,
    /// Outbound receiver (consumed by the message loop).
    outbound_rx: Arc<TokioMutex<mpsc::Receiver<String>>>,
    /// Cancellation token for graceful shutdown.
    shutdown_token: CancellationToken,
}

impl StreamConnection {
    pub fn new(config: ConnectionConfig, signer: AuthSigner) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(100);
        Self {
            config,
            signer,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            registry: Arc::new(SubscriptionRegistry::new()),
            request_id: AtomicU64::new(1),
            outbound_tx,
            outbound_rx: Arc::new(TokioMutex::new(outbound_rx)),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Signal graceful shutdown. Idempotent.
    ///
    /// Cancels the shutdown token, which exits the message loop and aborts
    /// any reconnect backoff sleep in progress.
    pub fn stop(&self) {
        info!("Stream connection stop requested");
        self.shutdown_token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Subscribe market tickers on a channel, optionally attaching an
    /// observer for that channel's frames.
    ///
    /// Tickers already subscribed on the channel are not re-sent; if none
    /// of the requested tickers are new, nothing goes on the wire. While
    /// disconnected the tickers are only recorded, and the replay performed
    /// on (re)connect puts them on the wire.
    pub async fn subscribe(
        &self,
        channel: &str,
        tickers: &[String],
        observer: Option<Observer>,
    ) -> WsResult<()> {
        if let Some(observer) = observer {
            self.registry.add_observer(channel, observer);
        }

        let new_tickers = self.registry.track_new(channel, tickers);
        if new_tickers.is_empty() {
            debug!(channel, "No new tickers to subscribe");
            return Ok(());
        }

        if self.state() != ConnectionState::Connected {
            debug!(
                channel,
                count = new_tickers.len(),
                "Not connected, deferring subscription to replay"
            );
            return Ok(());
        }

        let command = SubscribeCommand::new(self.next_request_id(), channel, new_tickers);
        let text = serde_json::to_string(&command)?;
        self.outbound_tx
            .send(text)
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))?;
        Ok(())
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Connect and run the message loop until [`stop`](Self::stop) is
    /// called, reconnecting with exponential backoff on any failure.
    pub async fn run(&self) -> WsResult<()> {
        let mut attempt = 0u32;

        loop {
            if self.is_stopped() {
                info!("Stop requested, exiting connect loop");
                *self.state.write() = ConnectionState::Stopped;
                return Ok(());
            }

            *self.state.write() = ConnectionState::Connecting;

            match self.try_connect(&mut attempt).await {
                Ok(()) => {
                    info!("WebSocket connection closed");
                }
                Err(e) => {
                    error!(?e, "WebSocket connection error");
                }
            }

            if self.is_stopped() {
                info!("Stop requested after disconnect, not reconnecting");
                *self.state.write() = ConnectionState::Stopped;
                return Ok(());
            }

            attempt += 1;
            *self.state.write() = ConnectionState::Reconnecting;

            let delay = backoff_delay(
                self.config.reconnect_base_delay_ms,
                self.config.reconnect_max_delay_ms,
                attempt,
            );
            warn!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");

            // Wait for delay OR stop signal (cancellation-aware sleep)
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown_token.cancelled() => {
                    info!("Stop requested during backoff, exiting");
                    *self.state.write() = ConnectionState::Stopped;
                    return Ok(());
                }
            }
        }
    }

    async fn try_connect(&self, attempt: &mut u32) -> WsResult<()> {
        info!(url = %self.config.url, "Connecting to WebSocket");

        let mut request = self.config.url.as_str().into_client_request()?;
        let path = request.uri().path().to_string();
        for (name, value) in self.signer.headers("GET", &path)? {
            let value = value
                .parse()
                .map_err(|_| WsError::InvalidHeader(name.to_string()))?;
            request.headers_mut().insert(name, value);
        }

        let (ws_stream, _response) = connect_async(request).await?;
        let (mut write, mut read) = ws_stream.split();

        *self.state.write() = ConnectionState::Connected;
        *attempt = 0;
        info!("WebSocket connected");

        // Replay the full subscription set for every channel.
        for (channel, tickers) in self.registry.subscriptions() {
            let command = SubscribeCommand::new(self.next_request_id(), &channel, tickers);
            let text = serde_json::to_string(&command)?;
            write.send(Message::Text(text)).await?;
            info!(channel = %channel, "Replayed subscriptions");
        }

        loop {
            let outbound_recv = async { self.outbound_rx.lock().await.recv().await };

            tokio::select! {
                () = self.shutdown_token.cancelled() => {
                    info!("Stop signal received in message loop");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        warn!(?e, "Failed to send Close frame during shutdown");
                    }
                    *self.state.write() = ConnectionState::Stopped;
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if text == HEARTBEAT_FRAME {
                                debug!("Heartbeat received");
                            } else {
                                self.handle_text_frame(&text).await;
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            debug!("Received pong");
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            warn!(code, %reason, "WebSocket closed by server");
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => {
                            error!(?e, "WebSocket read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return Ok(());
                        }
                        _ => {}
                    }
                }

                outbound = outbound_recv => {
                    if let Some(text) = outbound {
                        write.send(Message::Text(text)).await?;
                    }
                }
            }
        }
    }

    /// Decode a frame and dispatch it to the channel's observers in
    /// registration order. Undecodable frames are dropped, never fatal.
    async fn handle_text_frame(&self, text: &str) {
        let message = match StreamMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable frame");
                return;
            }
        };

        match message.channel() {
            Some(channel) => {
                for observer in self.registry.observers(channel) {
                    observer(message.clone()).await;
                }
            }
            None => match message {
                StreamMessage::Subscribed => debug!("Subscription acknowledged"),
                StreamMessage::Unhandled { msg_type } => {
                    debug!(msg_type = %msg_type, "Ignoring unhandled frame type");
                }
                _ => {}
            },
        }
    }
}

/// Exponential backoff: base * 2^(attempt-1), capped at max.
fn backoff_delay(base_ms: u64, max_ms: u64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    let delay = base_ms.saturating_mul(1u64 << exponent).min(max_ms);
    Duration::from_millis(delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConnectionConfig::default();
        assert_eq!(config.reconnect_base_delay_ms, 1000);
        assert_eq!(config.reconnect_max_delay_ms, 60000);
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let delays: Vec<u64> = (1..=8)
            .map(|attempt| backoff_delay(1000, 60000, attempt).as_millis() as u64)
            .collect();
        assert_eq!(
            delays,
            vec![1000, 2000, 4000, 8000, 16000, 32000, 60000, 60000]
        );
    }

    #[test]
    fn test_backoff_reset_restarts_sequence() {
        // After a successful connect the attempt counter goes back to zero,
        // so the next failure waits the base delay again.
        assert_eq!(backoff_delay(1000, 60000, 7).as_millis(), 60000);
        assert_eq!(backoff_delay(1000, 60000, 1).as_millis(), 1000);
    }

    #[tokio::test]
    async fn test_subscribe_dedups_wire_sends_while_disconnected() {
        let conn = StreamConnection::new(ConnectionConfig::default(), AuthSigner::new("k", "s"));

        conn.subscribe("ticker_v2", &["A".to_string(), "B".to_string()], None)
            .await
            .unwrap();
        conn.subscribe("ticker_v2", &["B".to_string(), "C".to_string()], None)
            .await
            .unwrap();

        let subs = conn.registry.subscriptions();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].1, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let conn = StreamConnection::new(ConnectionConfig::default(), AuthSigner::new("k", "s"));
        conn.stop();
        conn.stop();
        assert!(conn.is_stopped());

        // run() must exit immediately without touching the network.
        conn.run().await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Stopped);
    }
}
