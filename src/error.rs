//! Unified error types for the arbitrage engine.

use thiserror::Error;

/// Unified error type for the arbitrage engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Venue-level error.
    #[error("venue error: {0}")]
    Venue(#[from] VenueError),

    /// Every order-book fetcher has terminated; the engine cannot operate
    /// blind and must exit.
    #[error("all order-book fetchers have terminated")]
    FetchersDead,

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by an exchange adapter.
///
/// Decision outcomes such as insufficient funds or insufficient liquidity
/// are *not* errors; they are normal, frequent results of the sizing step
/// and are modeled in [`crate::arbitrage::SizingOutcome`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VenueError {
    /// Top-of-book could not be fetched (transport or parse failure, or an
    /// explicit failure marker from the venue).
    #[error("order book unavailable on {venue}: {reason}")]
    BookUnavailable {
        /// Venue that failed.
        venue: String,
        /// Reason for failure.
        reason: String,
    },

    /// Account balances could not be fetched.
    #[error("balance unavailable on {venue}: {reason}")]
    BalanceUnavailable {
        /// Venue that failed.
        venue: String,
        /// Reason for failure.
        reason: String,
    },

    /// The venue did not confirm acceptance of a submitted order.
    #[error("order rejected by {venue}: {reason}")]
    OrderRejected {
        /// Venue that rejected the order.
        venue: String,
        /// Rejection reason.
        reason: String,
    },
}

impl VenueError {
    /// The venue this error originated from.
    pub fn venue(&self) -> &str {
        match self {
            Self::BookUnavailable { venue, .. }
            | Self::BalanceUnavailable { venue, .. }
            | Self::OrderRejected { venue, .. } => venue,
        }
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_error_reports_origin() {
        let err = VenueError::OrderRejected {
            venue: "alpha".to_string(),
            reason: "below minimum".to_string(),
        };
        assert_eq!(err.venue(), "alpha");
        assert_eq!(
            err.to_string(),
            "order rejected by alpha: below minimum"
        );
    }

    #[test]
    fn engine_error_wraps_venue_error() {
        let err: EngineError = VenueError::BookUnavailable {
            venue: "beta".to_string(),
            reason: "timeout".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::Venue(_)));
    }
}
