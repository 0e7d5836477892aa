//! In-memory market state.
//!
//! Holds the per-market snapshots, order books, and the event membership
//! index. Seeded from REST bootstrap, then kept current by stream frames.

pub mod error;
pub mod store;

pub use error::{FeedError, FeedResult};
pub use store::MarketStore;
