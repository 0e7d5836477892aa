//! REST response DTOs.
//!
//! Prices arrive as integer cents, timestamps as RFC3339 strings. Most
//! fields are defaulted: the venue omits zero-valued quote fields.

use chrono::{DateTime, Utc};
use kalshi_core::{EventTicker, MarketSnapshot, OrderBook, OrderBookSide, Price, Ticker};
use serde::Deserialize;

/// One market from `/markets` or nested in `/events`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMarket {
    pub ticker: String,
    #[serde(default)]
    pub event_ticker: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    pub yes_bid: Option<i64>,
    pub yes_ask: Option<i64>,
    pub no_bid: Option<i64>,
    pub no_ask: Option<i64>,
    pub last_price: Option<i64>,
    #[serde(default)]
    pub volume: i64,
    #[serde(default)]
    pub volume_24h: i64,
    #[serde(default)]
    pub liquidity: i64,
    pub expiration_time: Option<DateTime<Utc>>,
    /// Folded in from the enclosing event when fetched via `/events`.
    #[serde(default)]
    pub event_title: String,
    #[serde(default)]
    pub category: String,
}

impl ApiMarket {
    /// Whether the venue reports this market as tradeable.
    pub fn is_open(&self) -> bool {
        matches!(self.status.as_str(), "active" | "open")
    }

    /// Build the initial store snapshot for this market.
    pub fn to_snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            ticker: Ticker::new(self.ticker.clone()),
            event_ticker: EventTicker::new(if self.event_ticker.is_empty() {
                self.ticker.clone()
            } else {
                self.event_ticker.clone()
            }),
            title: self.title.clone(),
            status: self.status.clone(),
            yes_bid: self.yes_bid.map(Price::new),
            yes_ask: self.yes_ask.map(Price::new),
            no_bid: self.no_bid.map(Price::new),
            no_ask: self.no_ask.map(Price::new),
            last_price: self.last_price.map(Price::new),
            volume: self.volume,
            volume_24h: self.volume_24h,
            expiration_time: self.expiration_time,
            updated_at: Utc::now(),
        }
    }
}

/// Book depth from `/markets/{ticker}/orderbook`.
///
/// Either side may be null when no resting orders exist.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiOrderbook {
    #[serde(default)]
    pub yes: Option<Vec<(i64, i64)>>,
    #[serde(default)]
    pub no: Option<Vec<(i64, i64)>>,
}

impl ApiOrderbook {
    /// Build the initial in-memory book.
    pub fn to_book(&self) -> OrderBook {
        OrderBook::new(
            OrderBookSide::from_levels(self.yes.clone().unwrap_or_default()),
            OrderBookSide::from_levels(self.no.clone().unwrap_or_default()),
        )
    }
}

/// One event from `/events?with_nested_markets=true`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEvent {
    pub event_ticker: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub markets: Vec<ApiMarket>,
}

impl ApiEvent {
    /// Flatten nested markets, folding the event metadata into each one.
    pub fn into_markets(self) -> Vec<ApiMarket> {
        let ApiEvent {
            event_ticker,
            title,
            category,
            markets,
        } = self;
        markets
            .into_iter()
            .map(|mut market| {
                if market.event_ticker.is_empty() {
                    market.event_ticker = event_ticker.clone();
                }
                market.event_title = title.clone();
                market.category = category.clone();
                market
            })
            .collect()
    }
}
