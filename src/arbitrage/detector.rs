//! Order-book trust checks and counter-venue selection.

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::debug;

use crate::orderbook::{BookSnapshot, PriceLevel};
use crate::venue::VenueId;

/// Per-venue timestamps of our own last order attempt.
///
/// An order attempt (successful or not) changes the venue's state, so any
/// quote fetched before it must not be reused for a new decision.
#[derive(Debug)]
pub struct TransactionClock {
    times: HashMap<VenueId, OffsetDateTime>,
}

impl TransactionClock {
    /// Create a clock for the given venues, all set to `at`.
    pub fn new(venues: &[VenueId], at: OffsetDateTime) -> Self {
        let times = venues.iter().map(|venue| (venue.clone(), at)).collect();
        Self { times }
    }

    /// Our last transaction time on a venue.
    pub fn get(&self, venue: &str) -> Option<OffsetDateTime> {
        self.times.get(venue).copied()
    }

    /// Record an order attempt on a venue. Never moves backwards.
    pub fn bump(&mut self, venue: &str, at: OffsetDateTime) {
        self.times
            .entry(venue.to_string())
            .and_modify(|time| *time = (*time).max(at))
            .or_insert(at);
    }
}

/// Whether a venue's snapshot can be trusted for a decision at `now`.
///
/// It must have been refreshed after our own last transaction on that venue
/// and must be younger than the freshness window.
pub fn is_book_valid(
    book: &BookSnapshot,
    last_transaction: OffsetDateTime,
    now: OffsetDateTime,
    valid_window: Duration,
) -> bool {
    book.last_update > last_transaction && book.age_secs(now) < valid_window.as_secs_f64()
}

/// Whether two venues' snapshots are close enough in time to be compared.
pub fn books_in_sync(a: &BookSnapshot, b: &BookSnapshot, tolerance: Duration) -> bool {
    (a.last_update - b.last_update).abs().as_seconds_f64() <= tolerance.as_secs_f64()
}

/// A profitable counter-venue for a prospective buyer venue.
#[derive(Debug, Clone)]
pub struct Opportunity {
    /// Venue to sell on.
    pub seller: VenueId,
    /// That venue's best bid.
    pub seller_bid: PriceLevel,
    /// Net profit fraction after the buyer's fee deduction.
    pub profit: Decimal,
}

/// Pick the highest bidder among the candidate venues and test it for
/// profitability against the buyer's ask.
///
/// `candidates` must already be filtered for validity and synchronization.
/// Ties are broken by iteration order; a true tie yields equal profit.
pub fn find_counter_venue(
    buyer_ask: &PriceLevel,
    buyer_fee_deduction: Decimal,
    candidates: &[(VenueId, PriceLevel)],
    profit_threshold: Decimal,
) -> Option<Opportunity> {
    if buyer_ask.price <= Decimal::ZERO {
        return None;
    }

    let mut best: Option<&(VenueId, PriceLevel)> = None;
    for candidate in candidates {
        if best.map_or(true, |current| candidate.1.price > current.1.price) {
            best = Some(candidate);
        }
    }
    let (seller, seller_bid) = best?;

    let profit = (seller_bid.price - buyer_ask.price) / buyer_ask.price - buyer_fee_deduction;
    if profit > profit_threshold {
        Some(Opportunity {
            seller: seller.clone(),
            seller_bid: *seller_bid,
            profit,
        })
    } else {
        debug!(
            seller = %seller,
            profit = %profit,
            threshold = %profit_threshold,
            "best counter bid not profitable"
        );
        None
    }
}
