//! Concurrently shared venue→snapshot order-book store.
//!
//! Each venue's entry has exactly one writer (its fetcher) and any number of
//! readers (the decision loop). Writes replace the whole snapshot, never
//! individual fields, so readers can never observe a half-updated book.

use dashmap::DashMap;
use time::OffsetDateTime;

use super::types::{BookSnapshot, TopOfBook};
use crate::venue::VenueId;

/// Shared mapping from venue name to its latest order-book snapshot.
#[derive(Debug, Default)]
pub struct BookStore {
    books: DashMap<VenueId, BookSnapshot>,
}

impl BookStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a venue with the zero sentinel. Called once per configured venue
    /// at engine start; entries live for the process lifetime.
    pub fn seed(&self, venue: &str, at: OffsetDateTime) {
        self.books
            .entry(venue.to_string())
            .or_insert_with(|| BookSnapshot::sentinel(at));
    }

    /// Read a venue's latest snapshot.
    pub fn get(&self, venue: &str) -> Option<BookSnapshot> {
        self.books.get(venue).map(|entry| *entry)
    }

    /// Replace a venue's snapshot with a freshly fetched top-of-book.
    ///
    /// `last_update` never moves backwards; a write carrying an older
    /// timestamp than the stored snapshot keeps the stored timestamp.
    pub fn replace(&self, venue: &str, top: TopOfBook, at: OffsetDateTime) {
        self.books
            .entry(venue.to_string())
            .and_modify(|snapshot| {
                let last_update = snapshot.last_update.max(at);
                *snapshot = BookSnapshot {
                    bid: top.bid,
                    ask: top.ask,
                    last_update,
                };
            })
            .or_insert_with(|| BookSnapshot::new(top, at));
    }

    /// Bump a venue's `last_update` without touching prices. Used when the
    /// venue keeps echoing an unchanged quote inside its expected refresh
    /// cadence.
    pub fn touch(&self, venue: &str, at: OffsetDateTime) {
        if let Some(mut entry) = self.books.get_mut(venue) {
            entry.last_update = entry.last_update.max(at);
        }
    }

    /// Names of all venues currently tracked.
    pub fn venues(&self) -> Vec<VenueId> {
        self.books.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::types::PriceLevel;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    fn top(bid: rust_decimal::Decimal, ask: rust_decimal::Decimal) -> TopOfBook {
        TopOfBook {
            bid: PriceLevel::new(bid, dec!(100)),
            ask: PriceLevel::new(ask, dec!(100)),
        }
    }

    #[test]
    fn seed_installs_sentinel_once() {
        let store = BookStore::new();
        let t0 = datetime!(2024-01-01 00:00:00 UTC);
        store.seed("alpha", t0);

        let snapshot = store.get("alpha").unwrap();
        assert_eq!(snapshot.bid, PriceLevel::zero());

        // Re-seeding does not clobber a live snapshot.
        store.replace("alpha", top(dec!(1.00), dec!(1.02)), t0);
        store.seed("alpha", datetime!(2024-01-02 00:00:00 UTC));
        assert_eq!(store.get("alpha").unwrap().bid.price, dec!(1.00));
    }

    #[test]
    fn replace_is_visible_to_readers() {
        let store = BookStore::new();
        let t0 = datetime!(2024-01-01 00:00:00 UTC);
        store.seed("alpha", t0);

        let t1 = datetime!(2024-01-01 00:00:01 UTC);
        store.replace("alpha", top(dec!(1.00), dec!(1.02)), t1);

        let snapshot = store.get("alpha").unwrap();
        assert_eq!(snapshot.ask.price, dec!(1.02));
        assert_eq!(snapshot.last_update, t1);
    }

    #[test]
    fn last_update_never_moves_backwards() {
        let store = BookStore::new();
        let t1 = datetime!(2024-01-01 00:00:05 UTC);
        store.seed("alpha", t1);
        store.replace("alpha", top(dec!(1.00), dec!(1.02)), t1);

        let earlier = datetime!(2024-01-01 00:00:01 UTC);
        store.replace("alpha", top(dec!(1.10), dec!(1.12)), earlier);

        let snapshot = store.get("alpha").unwrap();
        // Prices move, the clock does not run backwards.
        assert_eq!(snapshot.bid.price, dec!(1.10));
        assert_eq!(snapshot.last_update, t1);

        store.touch("alpha", earlier);
        assert_eq!(store.get("alpha").unwrap().last_update, t1);
    }

    #[test]
    fn touch_bumps_timestamp_only() {
        let store = BookStore::new();
        let t1 = datetime!(2024-01-01 00:00:00 UTC);
        store.seed("alpha", t1);
        store.replace("alpha", top(dec!(1.00), dec!(1.02)), t1);

        let t2 = datetime!(2024-01-01 00:00:02 UTC);
        store.touch("alpha", t2);

        let snapshot = store.get("alpha").unwrap();
        assert_eq!(snapshot.bid.price, dec!(1.00));
        assert_eq!(snapshot.last_update, t2);
    }

    #[test]
    fn venues_lists_tracked_names() {
        let store = BookStore::new();
        let t0 = datetime!(2024-01-01 00:00:00 UTC);
        store.seed("alpha", t0);
        store.seed("beta", t0);

        let mut venues = store.venues();
        venues.sort();
        assert_eq!(venues, vec!["alpha".to_string(), "beta".to_string()]);
    }
}
