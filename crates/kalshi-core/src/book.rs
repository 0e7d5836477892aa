//! Order book depth maintained from REST snapshots plus stream deltas.
//!
//! Each side is a list of (price, size) levels kept strictly descending by
//! price. Sizes are resting contract counts; a level whose size reaches
//! zero is removed rather than kept at zero.

use crate::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One resting price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub size: i64,
}

/// Which side of the binary book a delta targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSide {
    Yes,
    No,
}

impl std::fmt::Display for BookSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => f.write_str("yes"),
            Self::No => f.write_str("no"),
        }
    }
}

/// One side of the book, sorted descending by price.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBookSide {
    levels: Vec<PriceLevel>,
}

impl OrderBookSide {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a side from raw (price, size) pairs, dropping empty levels.
    pub fn from_levels(pairs: impl IntoIterator<Item = (i64, i64)>) -> Self {
        let mut levels: Vec<PriceLevel> = pairs
            .into_iter()
            .filter(|(_, size)| *size > 0)
            .map(|(price, size)| PriceLevel {
                price: Price::new(price),
                size,
            })
            .collect();
        levels.sort_by(|a, b| b.price.cmp(&a.price));
        Self { levels }
    }

    /// Apply a signed size delta at a price level.
    ///
    /// A delta that drains a level to zero (or below) removes it. A positive
    /// delta at an unknown price inserts a new level; a negative one for an
    /// unknown price is dropped.
    pub fn apply_delta(&mut self, price: Price, delta: i64) {
        if let Some(idx) = self.levels.iter().position(|l| l.price == price) {
            let next = self.levels[idx].size + delta;
            if next <= 0 {
                self.levels.remove(idx);
            } else {
                self.levels[idx].size = next;
            }
        } else if delta > 0 {
            self.levels.push(PriceLevel { price, size: delta });
            self.levels.sort_by(|a, b| b.price.cmp(&a.price));
        }
    }

    /// Highest-priced level, if any.
    pub fn best(&self) -> Option<&PriceLevel> {
        self.levels.first()
    }

    pub fn levels(&self) -> &[PriceLevel] {
        &self.levels
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Total resting size across all levels.
    pub fn total_size(&self) -> i64 {
        self.levels.iter().map(|l| l.size).sum()
    }
}

/// Both sides of one market's book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    pub yes: OrderBookSide,
    pub no: OrderBookSide,
    pub updated_at: DateTime<Utc>,
}

impl OrderBook {
    pub fn new(yes: OrderBookSide, no: OrderBookSide) -> Self {
        Self {
            yes,
            no,
            updated_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(OrderBookSide::new(), OrderBookSide::new())
    }

    pub fn side(&self, side: BookSide) -> &OrderBookSide {
        match side {
            BookSide::Yes => &self.yes,
            BookSide::No => &self.no,
        }
    }

    pub fn side_mut(&mut self, side: BookSide) -> &mut OrderBookSide {
        match side {
            BookSide::Yes => &mut self.yes,
            BookSide::No => &mut self.no,
        }
    }

    /// Apply a delta and refresh the book timestamp.
    pub fn apply_delta(&mut self, side: BookSide, price: Price, delta: i64) {
        self.side_mut(side).apply_delta(price, delta);
        self.updated_at = Utc::now();
    }
}
