//! Arbitrage detection.
//!
//! Both checks are pure functions of snapshots and a clock value, so they
//! can run on every stream update without touching shared state.

use crate::config::DetectorConfig;
use crate::signal::{MultiWayOpportunity, SingleMarketOpportunity};
use chrono::{DateTime, Utc};
use kalshi_core::{MarketSnapshot, Price};
use rust_decimal::Decimal;

/// Evaluates snapshots for mispricing worth alerting on.
#[derive(Debug, Clone, Default)]
pub struct ArbitrageDetector {
    config: DetectorConfig,
}

impl ArbitrageDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Single-market check: YES bid + NO bid vs the 100¢ payout.
    ///
    /// Requires both bids quoted and positive, a known future expiration,
    /// and net profit at or above the configured floor.
    pub fn check_market(
        &self,
        snapshot: &MarketSnapshot,
        now: DateTime<Utc>,
    ) -> Option<SingleMarketOpportunity> {
        let yes_bid = snapshot.yes_bid.filter(Price::is_positive)?;
        let no_bid = snapshot.no_bid.filter(Price::is_positive)?;

        let sum = yes_bid.cents() + no_bid.cents();
        let deviation = Decimal::from((sum - Price::PAYOUT).abs());
        if deviation.is_zero() {
            return None;
        }

        let days = snapshot.days_to_expiration(now)?;
        if days <= Decimal::ZERO {
            return None;
        }

        let net_profit = self.net_profit(deviation);
        if net_profit < self.config.min_net_profit {
            return None;
        }

        Some(SingleMarketOpportunity {
            ticker: snapshot.ticker.clone(),
            yes_bid,
            no_bid,
            deviation,
            net_profit,
            days_to_expiration: days,
        })
    }

    /// Multi-way check: total implied probability across an event's
    /// members vs 100%.
    ///
    /// Needs at least two members and at least two of them priced. The
    /// soonest member expiration bounds the holding period and must be in
    /// the future.
    pub fn check_event(
        &self,
        snapshots: &[MarketSnapshot],
        now: DateTime<Utc>,
    ) -> Option<MultiWayOpportunity> {
        if snapshots.len() < 2 {
            return None;
        }

        let prices: Vec<Decimal> = snapshots
            .iter()
            .filter_map(|s| s.best_yes_price())
            .map(|p| p.prob())
            .collect();
        if prices.len() < 2 {
            return None;
        }

        let total: Decimal = prices.iter().sum();
        let deviation = (total * Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED).abs();
        if deviation.is_zero() {
            return None;
        }

        let days = snapshots
            .iter()
            .filter_map(|s| s.days_to_expiration(now))
            .min()?;
        if days <= Decimal::ZERO {
            return None;
        }

        let net_profit = self.net_profit(deviation);
        if net_profit < self.config.min_net_profit {
            return None;
        }

        Some(MultiWayOpportunity {
            event_ticker: snapshots[0].event_ticker.clone(),
            total_probability: total,
            deviation,
            net_profit,
            market_count: snapshots.len(),
            priced_count: prices.len(),
            days_to_expiration: days,
        })
    }

    /// Net dollars from a deviation in percentage points: one cent of edge
    /// per contract per point, minus the fee fraction.
    fn net_profit(&self, deviation_pp: Decimal) -> Decimal {
        let gross = deviation_pp * Decimal::from(self.config.contracts) / Decimal::ONE_HUNDRED;
        gross * (Decimal::ONE - self.config.fee_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use kalshi_core::{EventTicker, Ticker};
    use rust_decimal_macros::dec;

    fn snapshot(ticker: &str, event: &str) -> MarketSnapshot {
        let mut snap = MarketSnapshot::new(Ticker::new(ticker), EventTicker::new(event));
        snap.expiration_time = Some(Utc::now() + Duration::days(3));
        snap
    }

    fn detector() -> ArbitrageDetector {
        ArbitrageDetector::new(DetectorConfig::default())
    }

    #[test]
    fn test_single_market_sum_above_payout() {
        // 52 + 51 = 103: 3pp edge, $3 gross at 100 contracts, $2.79 net.
        let mut snap = snapshot("MKT-A", "EVT");
        snap.yes_bid = Some(Price::new(52));
        snap.no_bid = Some(Price::new(51));

        let opp = detector().check_market(&snap, Utc::now()).unwrap();
        assert_eq!(opp.deviation, dec!(3));
        assert_eq!(opp.net_profit, dec!(2.79));
        assert!(opp.days_to_expiration > Decimal::ZERO);
    }

    #[test]
    fn test_single_market_below_profit_floor() {
        // 1pp deviation nets $0.93, under the $1 floor.
        let mut snap = snapshot("MKT-A", "EVT");
        snap.yes_bid = Some(Price::new(52));
        snap.no_bid = Some(Price::new(49));

        assert!(detector().check_market(&snap, Utc::now()).is_none());
    }

    #[test]
    fn test_single_market_exact_payout_sum_is_fair() {
        let mut snap = snapshot("MKT-A", "EVT");
        snap.yes_bid = Some(Price::new(52));
        snap.no_bid = Some(Price::new(48));

        assert!(detector().check_market(&snap, Utc::now()).is_none());
    }

    #[test]
    fn test_single_market_requires_both_bids() {
        let mut snap = snapshot("MKT-A", "EVT");
        snap.yes_bid = Some(Price::new(52));
        snap.no_bid = Some(Price::ZERO);

        assert!(detector().check_market(&snap, Utc::now()).is_none());
    }

    #[test]
    fn test_single_market_expired_is_skipped() {
        let mut snap = snapshot("MKT-A", "EVT");
        snap.yes_bid = Some(Price::new(52));
        snap.no_bid = Some(Price::new(55));
        snap.expiration_time = Some(Utc::now() - Duration::hours(1));

        assert!(detector().check_market(&snap, Utc::now()).is_none());
    }

    #[test]
    fn test_single_market_unknown_expiration_is_skipped() {
        let mut snap = snapshot("MKT-A", "EVT");
        snap.yes_bid = Some(Price::new(52));
        snap.no_bid = Some(Price::new(55));
        snap.expiration_time = None;

        assert!(detector().check_market(&snap, Utc::now()).is_none());
    }

    #[test]
    fn test_multi_way_under_100() {
        // 40% + 55% = 95%: 5pp deviation, $4.65 net.
        let mut a = snapshot("MKT-A", "EVT");
        a.yes_ask = Some(Price::new(40));
        let mut b = snapshot("MKT-B", "EVT");
        b.yes_ask = Some(Price::new(55));

        let opp = detector().check_event(&[a, b], Utc::now()).unwrap();
        assert_eq!(opp.total_probability, dec!(0.95));
        assert_eq!(opp.deviation, dec!(5));
        assert_eq!(opp.net_profit, dec!(4.65));
        assert_eq!(opp.market_count, 2);
        assert_eq!(opp.priced_count, 2);
    }

    #[test]
    fn test_multi_way_falls_back_to_last_trade() {
        let mut a = snapshot("MKT-A", "EVT");
        a.last_price = Some(Price::new(40));
        let mut b = snapshot("MKT-B", "EVT");
        b.yes_ask = Some(Price::new(50));

        let opp = detector().check_event(&[a, b], Utc::now()).unwrap();
        assert_eq!(opp.total_probability, dec!(0.90));
    }

    #[test]
    fn test_multi_way_single_member_never_fires() {
        let mut a = snapshot("MKT-A", "EVT");
        a.yes_ask = Some(Price::new(40));

        assert!(detector().check_event(&[a], Utc::now()).is_none());
    }

    #[test]
    fn test_multi_way_needs_two_priced_members() {
        let mut a = snapshot("MKT-A", "EVT");
        a.yes_ask = Some(Price::new(40));
        let b = snapshot("MKT-B", "EVT");

        assert!(detector().check_event(&[a, b], Utc::now()).is_none());
    }

    #[test]
    fn test_multi_way_uses_soonest_expiration() {
        let mut a = snapshot("MKT-A", "EVT");
        a.yes_ask = Some(Price::new(40));
        let mut b = snapshot("MKT-B", "EVT");
        b.yes_ask = Some(Price::new(50));
        b.expiration_time = Some(Utc::now() - Duration::hours(1));

        // One member already expired: the event is not actionable.
        assert!(detector().check_event(&[a, b], Utc::now()).is_none());
    }
}
