//! Exchange venues.
//!
//! This module handles:
//! - The capability trait every venue adapter implements
//! - The in-memory paper venue used for smoke runs and tests
//!
//! Wire-level adapters for real venues (transport, signing, JSON parsing,
//! rate limiting) live in the embedding application, not here.

pub mod adapter;
pub mod paper;

pub use adapter::{ExchangeAdapter, OpenOrder, Side, VenueId};
pub use paper::{PaperVenue, PaperVenueBuilder, SubmittedOrder};
