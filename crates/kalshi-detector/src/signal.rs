//! Opportunity records emitted by the detector.

use kalshi_core::{EventTicker, Price, Ticker};
use rust_decimal::Decimal;

/// Both sides of one market sum away from the 100¢ payout.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleMarketOpportunity {
    pub ticker: Ticker,
    pub yes_bid: Price,
    pub no_bid: Price,
    /// |yes_bid + no_bid - 100| in percentage points.
    pub deviation: Decimal,
    /// Dollars, after fees, at the configured contract count.
    pub net_profit: Decimal,
    pub days_to_expiration: Decimal,
}

/// An event's member YES prices imply total probability away from 100%.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiWayOpportunity {
    pub event_ticker: EventTicker,
    /// Sum of implied probabilities across priced members (1.0 = 100%).
    pub total_probability: Decimal,
    /// |total - 100%| in percentage points.
    pub deviation: Decimal,
    /// Dollars, after fees, at the configured contract count.
    pub net_profit: Decimal,
    /// Members considered.
    pub market_count: usize,
    /// Members that actually carried a price.
    pub priced_count: usize,
    pub days_to_expiration: Decimal,
}
