//! REST client for Kalshi market and event discovery.
//!
//! Used at startup to select markets worth watching and during bootstrap to
//! seed the in-memory store before stream deltas arrive.

pub mod client;
pub mod error;
pub mod types;

pub use client::RestClient;
pub use error::{RegistryError, RegistryResult};
pub use types::{ApiEvent, ApiMarket, ApiOrderbook};
