//! The capability interface the engine consumes for every venue.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::balance::Balance;
use crate::error::VenueError;
use crate::orderbook::TopOfBook;

/// Opaque venue identifier.
pub type VenueId = String;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Buy the base asset with quote currency.
    Buy,
    /// Sell the base asset for quote currency.
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// An order resting on a venue, as reported by `open_orders`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOrder {
    /// Venue-assigned order id.
    pub id: String,
    /// Order side.
    pub side: Side,
    /// Limit price.
    pub price: Decimal,
    /// Remaining volume.
    pub volume: Decimal,
}

/// Capability interface implemented once per venue.
///
/// Implementations own venue-specific auth, retries and liquidity
/// sanitization: `top_of_book` must already have been reduced with
/// [`crate::orderbook::true_top_of_book`] before it is returned here.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// The venue's name.
    fn name(&self) -> VenueId;

    /// Fraction of gross profit consumed by this venue's trading fees.
    fn fee_deduction(&self) -> Decimal;

    /// Withdrawal-fee fraction applied when the purchased asset must leave
    /// this venue before it can be sold elsewhere. Zero for venues with no
    /// such constraint.
    fn withdrawal_fee(&self) -> Decimal;

    /// Number of decimal places the venue accepts in order volumes.
    fn volume_precision(&self) -> u32;

    /// Fetch the sanitized top of book.
    async fn top_of_book(&self) -> Result<TopOfBook, VenueError>;

    /// Fetch account balances.
    async fn balances(&self) -> Result<Balance, VenueError>;

    /// Submit a limit order. `Ok` means the venue accepted the order, not
    /// that it filled.
    async fn submit_order(
        &self,
        side: Side,
        price: Decimal,
        volume: Decimal,
    ) -> Result<(), VenueError>;

    /// List our resting orders on this venue. Used for unresolved-exposure
    /// checks, not on the tick path.
    async fn open_orders(&self) -> Result<Vec<OpenOrder>, VenueError>;
}
