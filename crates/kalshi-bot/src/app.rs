//! Main application orchestration.
//!
//! Coordinates all components:
//! - Market selection over the REST registry
//! - Stream connection lifecycle
//! - Batched bootstrap and subscription
//! - Update routing into the store
//! - Throttled arbitrage detection and alerting
//! - Periodic status logging and ctrl-c shutdown

use crate::config::{AppConfig, Credentials};
use crate::error::AppResult;
use crate::execution::{ExecutionHook, NoopExecutor};
use crate::selection::select_markets;
use chrono::Utc;
use futures_util::future::join_all;
use kalshi_core::Ticker;
use kalshi_detector::{AlertThrottle, ArbitrageDetector};
use kalshi_feed::MarketStore;
use kalshi_registry::RestClient;
use kalshi_telemetry::StatusReporter;
use kalshi_ws::{
    AuthSigner, Observer, StreamConnection, StreamMessage, CHANNEL_ORDERBOOK_DELTA,
    CHANNEL_TICKER, CHANNEL_TRADE,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Buffered stream messages between observers and the main loop.
const MESSAGE_BUFFER: usize = 1024;

/// Main application.
pub struct Application {
    config: AppConfig,
    store: Arc<MarketStore>,
    rest: RestClient,
    connection: Arc<StreamConnection>,
    detector: ArbitrageDetector,
    throttle: AlertThrottle,
    status: Arc<StatusReporter>,
    executor: Box<dyn ExecutionHook>,
}

impl Application {
    pub fn new(config: AppConfig, credentials: Credentials) -> AppResult<Self> {
        let rest = RestClient::new(
            &config.rest_url,
            AuthSigner::new(&credentials.api_key, &credentials.private_key),
        )?;
        let connection = Arc::new(StreamConnection::new(
            config.connection_config(),
            AuthSigner::new(&credentials.api_key, &credentials.private_key),
        ));
        let detector = ArbitrageDetector::new(config.detector.clone());
        let throttle = AlertThrottle::new(Duration::from_secs(config.alert_cooldown_secs));

        Ok(Self {
            config,
            store: Arc::new(MarketStore::new()),
            rest,
            connection,
            detector,
            throttle,
            status: Arc::new(StatusReporter::new()),
            executor: Box::new(NoopExecutor),
        })
    }

    /// Replace the execution hook.
    pub fn with_executor(mut self, executor: Box<dyn ExecutionHook>) -> Self {
        self.executor = executor;
        self
    }

    /// Run until ctrl-c.
    pub async fn run(&self) -> AppResult<()> {
        // Selection: busiest events from the registry, kept whole.
        let listing = self
            .rest
            .get_events_with_markets(self.config.event_pool, "open")
            .await?;
        let selected = select_markets(listing, self.config.top_events);
        let tickers: Vec<Ticker> = selected
            .iter()
            .map(|m| Ticker::new(m.ticker.clone()))
            .collect();
        info!(markets = tickers.len(), "Selected markets to monitor");
        self.status.set_tracked_markets(tickers.len());

        // Stream connection runs independently; subscriptions recorded
        // before it connects get replayed on connect.
        let connection = self.connection.clone();
        let connection_task = tokio::spawn(async move {
            if let Err(e) = connection.run().await {
                error!(?e, "Stream connection terminated");
            }
        });

        let (tx, mut rx) = mpsc::channel::<StreamMessage>(MESSAGE_BUFFER);
        let observer = forward_observer(tx);

        // One observer per channel, registered once.
        self.connection
            .subscribe(CHANNEL_TICKER, &[], Some(observer.clone()))
            .await?;
        self.connection
            .subscribe(CHANNEL_ORDERBOOK_DELTA, &[], Some(observer.clone()))
            .await?;
        self.connection
            .subscribe(CHANNEL_TRADE, &[], Some(observer))
            .await?;

        // Batched bootstrap + subscribe. A failed bootstrap leaves that
        // market without seed data but never aborts the batch.
        for batch in tickers.chunks(self.config.batch_size) {
            let results = join_all(batch.iter().map(|t| self.store.bootstrap(&self.rest, t))).await;
            for (ticker, result) in batch.iter().zip(results) {
                if let Err(e) = result {
                    warn!(ticker = %ticker, error = %e, "Bootstrap failed, market starts bare");
                }
            }

            let wire: Vec<String> = batch.iter().map(|t| t.as_str().to_string()).collect();
            self.connection.subscribe(CHANNEL_TICKER, &wire, None).await?;
            self.connection
                .subscribe(CHANNEL_ORDERBOOK_DELTA, &wire, None)
                .await?;
            self.connection.subscribe(CHANNEL_TRADE, &wire, None).await?;

            tokio::time::sleep(Duration::from_millis(self.config.batch_pause_ms)).await;
        }
        info!(bootstrapped = self.store.tracked_count(), "Bootstrap complete");

        let status = self.status.clone();
        let status_interval = Duration::from_secs(self.config.status_interval_secs);
        let status_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(status_interval);
            interval.tick().await;
            loop {
                interval.tick().await;
                status.log_status();
            }
        });

        loop {
            tokio::select! {
                message = rx.recv() => {
                    match message {
                        Some(message) => {
                            self.status.record_message();
                            self.handle_stream_message(message);
                        }
                        None => {
                            warn!("Stream observers gone, exiting main loop");
                            break;
                        }
                    }
                }
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!(?e, "Failed to listen for shutdown signal");
                    }
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.connection.stop();
        status_task.abort();
        let _ = connection_task.await;
        self.status.log_status();
        info!("Shutdown complete");
        Ok(())
    }

    /// Apply one stream message to the store, then run detection for the
    /// market it concerns.
    fn handle_stream_message(&self, message: StreamMessage) {
        match message {
            StreamMessage::Ticker(update) => {
                self.store.apply_ticker_update(&update);
                if let Some(ticker) = update.ticker.as_deref() {
                    self.check_arbitrage(ticker);
                }
            }
            StreamMessage::OrderbookDelta(delta) => {
                self.store.apply_orderbook_delta(&delta);
                if let Some(ticker) = delta.market_ticker.as_deref() {
                    self.check_arbitrage(ticker);
                }
            }
            StreamMessage::Trade(trade) => {
                // Trades carry no state the store keeps, but they signal
                // activity worth re-checking.
                if let Some(ticker) = trade.market_ticker.as_deref() {
                    self.check_arbitrage(ticker);
                }
            }
            StreamMessage::Subscribed => {}
            StreamMessage::Unhandled { msg_type } => {
                debug!(msg_type = %msg_type, "Unhandled stream message");
            }
        }
    }

    /// Gate, detect, alert: first the market alone, then its event.
    fn check_arbitrage(&self, ticker: &str) {
        let now = Utc::now();

        if let Some(snapshot) = self.store.snapshot(ticker) {
            if self.throttle.gate(ticker) {
                if let Some(opp) = self.detector.check_market(&snapshot, now) {
                    info!(
                        ticker = %opp.ticker,
                        yes_bid = %opp.yes_bid,
                        no_bid = %opp.no_bid,
                        deviation_pp = %opp.deviation,
                        net_profit_usd = %opp.net_profit,
                        days_to_expiration = %opp.days_to_expiration,
                        "Single-market arbitrage"
                    );
                    if self.config.auto_execute {
                        self.executor.execute_single(&opp);
                    }
                }
            }
        }

        let Some(event) = self.store.event_of(ticker) else {
            return;
        };
        if self.store.members(event.as_str()).len() < 2 {
            return;
        }
        if !self.throttle.gate(&AlertThrottle::event_key(event.as_str())) {
            return;
        }
        let snapshots = self.store.event_snapshots(event.as_str());
        if let Some(opp) = self.detector.check_event(&snapshots, now) {
            info!(
                event = %opp.event_ticker,
                total_probability = %opp.total_probability,
                deviation_pp = %opp.deviation,
                net_profit_usd = %opp.net_profit,
                markets = opp.market_count,
                priced = opp.priced_count,
                "Multi-way arbitrage"
            );
            if self.config.auto_execute {
                self.executor.execute_event(&opp);
            }
        }
    }
}

/// Observer that forwards every frame into the main loop's channel.
fn forward_observer(tx: mpsc::Sender<StreamMessage>) -> Observer {
    Arc::new(move |message| {
        let tx = tx.clone();
        Box::pin(async move {
            if tx.send(message).await.is_err() {
                warn!("Stream consumer dropped, discarding message");
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kalshi_core::{EventTicker, MarketSnapshot, Price};
    use kalshi_detector::{MultiWayOpportunity, SingleMarketOpportunity};
    use kalshi_ws::TickerPayload;
    use parking_lot::Mutex;

    fn test_app() -> Application {
        let credentials = Credentials {
            api_key: "key".to_string(),
            private_key: "secret".to_string(),
        };
        Application::new(AppConfig::default(), credentials).unwrap()
    }

    fn seeded_snapshot(ticker: &str, event: &str, yes_bid: i64, no_bid: i64) -> MarketSnapshot {
        let mut snap = MarketSnapshot::new(Ticker::new(ticker), EventTicker::new(event));
        snap.yes_bid = Some(Price::new(yes_bid));
        snap.no_bid = Some(Price::new(no_bid));
        snap.expiration_time = Some(Utc::now() + chrono::Duration::days(2));
        snap
    }

    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<String>>,
    }

    impl ExecutionHook for Arc<RecordingExecutor> {
        fn execute_single(&self, opportunity: &SingleMarketOpportunity) {
            self.calls.lock().push(opportunity.ticker.to_string());
        }

        fn execute_event(&self, opportunity: &MultiWayOpportunity) {
            self.calls.lock().push(opportunity.event_ticker.to_string());
        }
    }

    #[test]
    fn test_ticker_message_updates_store_and_consumes_throttle() {
        let app = test_app();
        app.store
            .insert_snapshot(seeded_snapshot("MKT-A", "EVT", 52, 51));

        app.handle_stream_message(StreamMessage::Ticker(TickerPayload {
            ticker: Some("MKT-A".into()),
            yes_bid: Some(53),
            ..Default::default()
        }));

        let snap = app.store.snapshot("MKT-A").unwrap();
        assert_eq!(snap.yes_bid, Some(Price::new(53)));
        // Detection ran: the per-ticker window is consumed.
        assert!(!app.throttle.gate("MKT-A"));
    }

    #[test]
    fn test_auto_execute_invokes_hook() {
        let executor = Arc::new(RecordingExecutor::default());
        let mut app = test_app().with_executor(Box::new(executor.clone()));
        app.config.auto_execute = true;

        // 52 + 51 nets $2.79 at defaults, over the $1 floor.
        app.store
            .insert_snapshot(seeded_snapshot("MKT-A", "EVT", 52, 51));
        app.check_arbitrage("MKT-A");

        assert_eq!(*executor.calls.lock(), vec!["MKT-A".to_string()]);
    }

    #[test]
    fn test_hook_not_invoked_when_auto_execute_off() {
        let executor = Arc::new(RecordingExecutor::default());
        let app = test_app().with_executor(Box::new(executor.clone()));

        app.store
            .insert_snapshot(seeded_snapshot("MKT-A", "EVT", 52, 51));
        app.check_arbitrage("MKT-A");

        assert!(executor.calls.lock().is_empty());
    }

    #[test]
    fn test_single_member_event_only_checks_market() {
        let app = test_app();
        app.store
            .insert_snapshot(seeded_snapshot("MKT-A", "EVT", 50, 50));

        app.check_arbitrage("MKT-A");

        // Market gate consumed, event gate untouched.
        assert!(!app.throttle.gate("MKT-A"));
        assert!(app.throttle.gate(&AlertThrottle::event_key("EVT")));
    }

    #[test]
    fn test_multi_member_event_consumes_event_gate() {
        let app = test_app();
        app.store
            .insert_snapshot(seeded_snapshot("MKT-A", "EVT", 50, 50));
        app.store
            .insert_snapshot(seeded_snapshot("MKT-B", "EVT", 30, 70));

        app.check_arbitrage("MKT-A");

        assert!(!app.throttle.gate(&AlertThrottle::event_key("EVT")));
    }
}
