//! Per-market snapshot state.
//!
//! A snapshot starts from a REST bootstrap and is then patched field by
//! field from `ticker_v2` stream frames. Stream frames are sparse: absent
//! fields must leave the previous value untouched.

use crate::{EventTicker, Price, Ticker};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sparse quote update extracted from a stream frame.
///
/// `None` means the field was absent from the frame, not that the quote
/// disappeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuotePatch {
    pub yes_bid: Option<Price>,
    pub yes_ask: Option<Price>,
    pub no_bid: Option<Price>,
    pub no_ask: Option<Price>,
    pub last_price: Option<Price>,
    pub volume: Option<i64>,
    /// Venue timestamp (epoch seconds), when the frame carries one.
    pub ts: Option<i64>,
}

/// Merged view of one market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: Ticker,
    pub event_ticker: EventTicker,
    pub title: String,
    /// Venue status string ("active", "open", "closed", ...).
    pub status: String,
    pub yes_bid: Option<Price>,
    pub yes_ask: Option<Price>,
    pub no_bid: Option<Price>,
    pub no_ask: Option<Price>,
    pub last_price: Option<Price>,
    pub volume: i64,
    pub volume_24h: i64,
    pub expiration_time: Option<DateTime<Utc>>,
    /// Wall-clock time of the last merge into this snapshot.
    pub updated_at: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Create an empty snapshot for a market seen only on the stream.
    pub fn new(ticker: Ticker, event_ticker: EventTicker) -> Self {
        Self {
            ticker,
            event_ticker,
            title: String::new(),
            status: String::new(),
            yes_bid: None,
            yes_ask: None,
            no_bid: None,
            no_ask: None,
            last_price: None,
            volume: 0,
            volume_24h: 0,
            expiration_time: None,
            updated_at: Utc::now(),
        }
    }

    /// Merge a sparse stream update. Absent fields keep their value.
    pub fn merge_quotes(&mut self, patch: &QuotePatch) {
        if let Some(p) = patch.yes_bid {
            self.yes_bid = Some(p);
        }
        if let Some(p) = patch.yes_ask {
            self.yes_ask = Some(p);
        }
        if let Some(p) = patch.no_bid {
            self.no_bid = Some(p);
        }
        if let Some(p) = patch.no_ask {
            self.no_ask = Some(p);
        }
        if let Some(p) = patch.last_price {
            self.last_price = Some(p);
        }
        if let Some(v) = patch.volume {
            self.volume = v;
        }
        self.updated_at = Utc::now();
    }

    /// Best price to buy YES: the ask if quoted, otherwise the last trade.
    ///
    /// Zero prices mean "no quote" and are skipped.
    pub fn best_yes_price(&self) -> Option<Price> {
        self.yes_ask
            .filter(Price::is_positive)
            .or(self.last_price.filter(Price::is_positive))
    }

    /// Fractional days until expiration. Negative once expired.
    pub fn days_to_expiration(&self, now: DateTime<Utc>) -> Option<Decimal> {
        let exp = self.expiration_time?;
        Some(Decimal::from((exp - now).num_seconds()) / Decimal::from(86_400))
    }

    /// Whether the venue reports this market as tradeable.
    pub fn is_open(&self) -> bool {
        matches!(self.status.as_str(), "active" | "open")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot::new(Ticker::new("MKT-A"), EventTicker::new("EVT"))
    }

    #[test]
    fn test_merge_sets_present_fields() {
        let mut snap = snapshot();
        snap.merge_quotes(&QuotePatch {
            yes_bid: Some(Price::new(52)),
            no_bid: Some(Price::new(47)),
            ..Default::default()
        });
        assert_eq!(snap.yes_bid, Some(Price::new(52)));
        assert_eq!(snap.no_bid, Some(Price::new(47)));
        assert_eq!(snap.yes_ask, None);
    }

    #[test]
    fn test_merge_leaves_absent_fields_unchanged() {
        let mut snap = snapshot();
        snap.yes_bid = Some(Price::new(52));
        snap.volume = 1000;

        snap.merge_quotes(&QuotePatch {
            yes_ask: Some(Price::new(54)),
            ..Default::default()
        });

        assert_eq!(snap.yes_bid, Some(Price::new(52)));
        assert_eq!(snap.yes_ask, Some(Price::new(54)));
        assert_eq!(snap.volume, 1000);
    }

    #[test]
    fn test_best_yes_price_prefers_ask() {
        let mut snap = snapshot();
        snap.yes_ask = Some(Price::new(40));
        snap.last_price = Some(Price::new(38));
        assert_eq!(snap.best_yes_price(), Some(Price::new(40)));
    }

    #[test]
    fn test_best_yes_price_falls_back_to_last_trade() {
        let mut snap = snapshot();
        snap.yes_ask = Some(Price::ZERO);
        snap.last_price = Some(Price::new(38));
        assert_eq!(snap.best_yes_price(), Some(Price::new(38)));
    }

    #[test]
    fn test_best_yes_price_none_when_unpriced() {
        let mut snap = snapshot();
        snap.yes_ask = Some(Price::ZERO);
        snap.last_price = Some(Price::ZERO);
        assert_eq!(snap.best_yes_price(), None);
    }

    #[test]
    fn test_days_to_expiration() {
        let now = Utc::now();
        let mut snap = snapshot();
        snap.expiration_time = Some(now + Duration::days(2));
        let days = snap.days_to_expiration(now).unwrap();
        assert_eq!(days, rust_decimal_macros::dec!(2));

        snap.expiration_time = Some(now - Duration::days(1));
        assert!(snap.days_to_expiration(now).unwrap() < rust_decimal::Decimal::ZERO);

        snap.expiration_time = None;
        assert!(snap.days_to_expiration(now).is_none());
    }
}
