//! Order-book acquisition and storage.
//!
//! This module handles:
//! - Top-of-book types and snapshots
//! - Liquidity sanitization (wall-order filtering)
//! - The shared venue→snapshot store
//! - Long-lived per-venue fetcher tasks

pub mod fetcher;
pub mod sanitize;
pub mod store;
pub mod types;

pub use fetcher::{BookFetcher, FetcherConfig, FetcherStats};
pub use sanitize::true_top_of_book;
pub use store::BookStore;
pub use types::{BookSnapshot, PriceLevel, TopOfBook};
