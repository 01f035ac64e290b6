//! Arbitrage decision engine.
//!
//! This module handles:
//! - Order-book validity and cross-venue synchronization checks
//! - Counter-venue selection and the profitability test
//! - Position sizing under balance and liquidity constraints
//! - Two-legged order execution with partial-failure handling
//! - The supervised decision loop

pub mod detector;
pub mod engine;
pub mod executor;
pub mod sizer;

pub use detector::{books_in_sync, find_counter_venue, is_book_valid, Opportunity, TransactionClock};
pub use engine::{Engine, EngineStats};
pub use executor::{ExecutionResult, OrderExecutor, TradePlan};
pub use sizer::{size_trade, SizingLimits, SizingOutcome};
