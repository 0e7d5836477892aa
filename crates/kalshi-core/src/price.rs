//! Cent-denominated contract price.
//!
//! Kalshi quotes binary contracts in whole cents between 0 and 100.
//! Prices travel on the wire as plain integers, so the newtype is
//! serde-transparent.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Contract price in cents (1..=99 for a live quote, 0 = no quote).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// Full payout of a settled contract, in cents.
    pub const PAYOUT: i64 = 100;

    pub fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Raw cent value.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Implied probability of the YES outcome (price / 100).
    pub fn prob(&self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(Self::PAYOUT)
    }

    /// Price in dollars.
    pub fn dollars(&self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(100)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}¢", self.0)
    }
}

impl From<i64> for Price {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}
