//! Order-book types and data structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Single price level: best bid or best ask after liquidity sanitization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceLevel {
    /// Price at this level.
    pub price: Decimal,
    /// Executable volume at this price.
    pub volume: Decimal,
}

impl PriceLevel {
    /// Create a new price level.
    pub fn new(price: Decimal, volume: Decimal) -> Self {
        Self { price, volume }
    }

    /// The zero sentinel used before a venue's first successful fetch.
    pub fn zero() -> Self {
        Self {
            price: Decimal::ZERO,
            volume: Decimal::ZERO,
        }
    }
}

/// Sanitized top-of-book pair returned by an exchange adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopOfBook {
    /// Best bid.
    pub bid: PriceLevel,
    /// Best ask.
    pub ask: PriceLevel,
}

/// Latest known top-of-book for one venue.
///
/// Written only by that venue's fetcher; read by the decision loop.
/// `last_update` is monotonically non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookSnapshot {
    /// Best bid.
    pub bid: PriceLevel,
    /// Best ask.
    pub ask: PriceLevel,
    /// When this snapshot was last confirmed by the venue.
    pub last_update: OffsetDateTime,
}

impl BookSnapshot {
    /// Create a snapshot from a fetched top-of-book.
    pub fn new(top: TopOfBook, last_update: OffsetDateTime) -> Self {
        Self {
            bid: top.bid,
            ask: top.ask,
            last_update,
        }
    }

    /// The zero sentinel seeded at engine start, before the first fetch.
    pub fn sentinel(at: OffsetDateTime) -> Self {
        Self {
            bid: PriceLevel::zero(),
            ask: PriceLevel::zero(),
            last_update: at,
        }
    }

    /// Whether the stored pair equals a freshly fetched one.
    pub fn same_prices(&self, top: &TopOfBook) -> bool {
        self.bid == top.bid && self.ask == top.ask
    }

    /// Snapshot age at `now`, in seconds.
    pub fn age_secs(&self, now: OffsetDateTime) -> f64 {
        (now - self.last_update).as_seconds_f64()
    }
}
