//! Core domain types for the Kalshi arbitrage monitor.
//!
//! This crate provides the fundamental types shared across the system:
//! - `Ticker`, `EventTicker`: market and event identifiers
//! - `Price`: cent-denominated contract price with implied probability
//! - `MarketSnapshot`: merged view of REST and stream market data
//! - `OrderBook`, `OrderBookSide`: depth state maintained from deltas

pub mod book;
pub mod error;
pub mod market;
pub mod price;
pub mod snapshot;

pub use book::{BookSide, OrderBook, OrderBookSide, PriceLevel};
pub use error::{CoreError, Result};
pub use market::{EventTicker, Ticker};
pub use price::Price;
pub use snapshot::{MarketSnapshot, QuotePatch};
