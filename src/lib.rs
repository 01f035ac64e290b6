//! Cross-exchange arbitrage engine for a single asset pair.
//!
//! The engine watches top-of-book quotes on two or more trading venues,
//! detects when one venue's best ask sits profitably below another venue's
//! best bid after fees, and places a buy order on the cheap venue followed
//! by a sell order on the expensive one.
//!
//! # Strategy
//!
//! ```text
//! venue alpha best ask:  1.00  (buy here)
//! venue beta  best bid:  1.05  (sell here)
//! ──────────────────────────────
//! gross edge:            5.0%
//! minus buyer fees:      4.0%  > threshold ✅
//! ```
//!
//! The engine never commits capital on data it cannot trust: order books
//! are aged, cross-checked against our own last transaction on each venue,
//! and synchronized pairwise before a trade is sized.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`venue`]: Exchange adapter capability trait and paper venue
//! - [`orderbook`]: Order-book store, liquidity sanitization, fetchers
//! - [`balance`]: Per-venue balance tracking
//! - [`arbitrage`]: Opportunity detection, sizing and execution
//! - [`notify`]: Fire-and-forget notification side channel
//! - [`api`]: HTTP API for health/metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod arbitrage;
pub mod balance;
pub mod config;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod orderbook;
pub mod utils;
pub mod venue;

pub use config::Config;
pub use error::{EngineError, Result, VenueError};
