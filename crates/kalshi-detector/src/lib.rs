//! Arbitrage detection over market snapshots.
//!
//! Two strategies: a single market whose YES and NO bids sum away from
//! 100¢, and an event whose member YES prices imply total probability away
//! from 100%. Detection is pure; alert pacing lives in [`AlertThrottle`].

pub mod config;
pub mod detector;
pub mod signal;
pub mod throttle;

pub use config::DetectorConfig;
pub use detector::ArbitrageDetector;
pub use signal::{MultiWayOpportunity, SingleMarketOpportunity};
pub use throttle::AlertThrottle;
