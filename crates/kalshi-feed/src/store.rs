//! Market store: snapshots, books, and event membership.
//!
//! Stream appliers never error: a frame missing its ticker, or a delta for
//! a book that was never bootstrapped, is dropped where it lands. Detection
//! only ever sees fields that were actually received.

use crate::error::{FeedError, FeedResult};
use dashmap::DashMap;
use kalshi_core::{EventTicker, MarketSnapshot, OrderBook, Price, Ticker};
use kalshi_registry::RestClient;
use kalshi_ws::{OrderbookDeltaPayload, TickerPayload};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Shared in-memory state for all tracked markets.
#[derive(Default)]
pub struct MarketStore {
    markets: DashMap<Ticker, MarketSnapshot>,
    books: DashMap<Ticker, OrderBook>,
    /// Event ticker -> member market tickers, in bootstrap order.
    events: DashMap<EventTicker, Vec<Ticker>>,
    /// Serializes bootstrap REST fetches and their store writes so that a
    /// concurrent stream frame never interleaves with a half-written seed.
    bootstrap_gate: Mutex<()>,
}

impl MarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one market from REST: snapshot plus initial book depth.
    ///
    /// Either piece may legitimately be absent (unknown ticker, no resting
    /// orders); whatever was fetched is kept. Transport failures surface as
    /// an error so the caller can log and move on to the next market.
    pub async fn bootstrap(&self, rest: &RestClient, ticker: &Ticker) -> FeedResult<()> {
        let _guard = self.bootstrap_gate.lock().await;

        let market = rest
            .get_market(ticker.as_str())
            .await
            .map_err(|source| FeedError::Bootstrap {
                ticker: ticker.to_string(),
                source,
            })?;
        match market {
            Some(market) => self.insert_snapshot(market.to_snapshot()),
            None => debug!(ticker = %ticker, "No market data at bootstrap"),
        }

        let book = rest
            .get_orderbook(ticker.as_str())
            .await
            .map_err(|source| FeedError::Bootstrap {
                ticker: ticker.to_string(),
                source,
            })?;
        match book {
            Some(book) => {
                self.books.insert(ticker.clone(), book.to_book());
            }
            None => debug!(ticker = %ticker, "No orderbook at bootstrap"),
        }

        Ok(())
    }

    /// Insert a snapshot and index it under its event.
    pub fn insert_snapshot(&self, snapshot: MarketSnapshot) {
        let ticker = snapshot.ticker.clone();
        let event = snapshot.event_ticker.clone();
        self.markets.insert(ticker.clone(), snapshot);

        let mut members = self.events.entry(event).or_default();
        if !members.contains(&ticker) {
            members.push(ticker);
        }
    }

    /// Merge a `ticker_v2` frame. Frames without a ticker are dropped.
    ///
    /// A market first seen on the stream gets a bare snapshot keyed by its
    /// own ticker; REST metadata fills in if a later bootstrap covers it.
    pub fn apply_ticker_update(&self, update: &TickerPayload) {
        let Some(ticker) = update.ticker.as_deref() else {
            debug!("Ticker frame without market_ticker dropped");
            return;
        };

        let patch = update.to_patch();
        match self.markets.get_mut(ticker) {
            Some(mut snapshot) => snapshot.merge_quotes(&patch),
            None => {
                let ticker = Ticker::new(ticker);
                let mut snapshot =
                    MarketSnapshot::new(ticker.clone(), EventTicker::new(ticker.as_str()));
                snapshot.merge_quotes(&patch);
                self.markets.insert(ticker, snapshot);
            }
        }
    }

    /// Apply an `orderbook_delta` frame. Deltas for unknown books, or
    /// frames missing any field, are dropped.
    pub fn apply_orderbook_delta(&self, delta: &OrderbookDeltaPayload) {
        let (Some(ticker), Some(side), Some(price), Some(amount)) = (
            delta.market_ticker.as_deref(),
            delta.side,
            delta.price,
            delta.delta,
        ) else {
            debug!("Incomplete orderbook delta dropped");
            return;
        };

        match self.books.get_mut(ticker) {
            Some(mut book) => book.apply_delta(side, Price::new(price), amount),
            None => warn!(ticker, "Delta for unknown book dropped"),
        }
    }

    /// Current snapshot for one market.
    pub fn snapshot(&self, ticker: &str) -> Option<MarketSnapshot> {
        self.markets.get(ticker).map(|s| s.clone())
    }

    /// Current book for one market.
    pub fn book(&self, ticker: &str) -> Option<OrderBook> {
        self.books.get(ticker).map(|b| b.clone())
    }

    /// Event a market belongs to, if known.
    pub fn event_of(&self, ticker: &str) -> Option<EventTicker> {
        self.markets.get(ticker).map(|s| s.event_ticker.clone())
    }

    /// Member markets of an event, in bootstrap order.
    pub fn members(&self, event: &str) -> Vec<Ticker> {
        self.events.get(event).map(|m| m.clone()).unwrap_or_default()
    }

    /// Snapshots of all of an event's members that have one.
    pub fn event_snapshots(&self, event: &str) -> Vec<MarketSnapshot> {
        self.members(event)
            .iter()
            .filter_map(|t| self.snapshot(t.as_str()))
            .collect()
    }

    /// Number of markets with a snapshot.
    pub fn tracked_count(&self) -> usize {
        self.markets.len()
    }
}
