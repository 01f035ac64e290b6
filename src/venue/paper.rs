//! In-memory paper venue.
//!
//! Implements [`ExchangeAdapter`] against seedable books and balances, with
//! scriptable failures. Used by the `run --paper` smoke mode and by tests;
//! no network requests are made.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::adapter::{ExchangeAdapter, OpenOrder, Side, VenueId};
use crate::balance::Balance;
use crate::error::VenueError;
use crate::orderbook::{true_top_of_book, PriceLevel, TopOfBook};

/// An order accepted by the paper venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedOrder {
    /// Order side.
    pub side: Side,
    /// Limit price.
    pub price: Decimal,
    /// Order volume.
    pub volume: Decimal,
}

/// In-memory venue with seedable depth lists and balances.
#[derive(Debug)]
pub struct PaperVenue {
    name: VenueId,
    fee_deduction: Decimal,
    withdrawal_fee: Decimal,
    volume_precision: u32,
    fake_order_threshold: Decimal,
    bids: Mutex<Vec<PriceLevel>>,
    asks: Mutex<Vec<PriceLevel>>,
    balance: Mutex<Balance>,
    open: Mutex<Vec<OpenOrder>>,
    submissions: Mutex<Vec<SubmittedOrder>>,
    fail_books: AtomicBool,
    fail_balances: AtomicBool,
    reject_orders: AtomicBool,
    next_order_id: AtomicU64,
}

impl PaperVenue {
    /// Replace the venue's depth lists (best price first).
    pub fn set_depth(&self, bids: Vec<PriceLevel>, asks: Vec<PriceLevel>) {
        *self.bids.lock().unwrap() = bids;
        *self.asks.lock().unwrap() = asks;
    }

    /// Replace the venue's balance.
    pub fn set_balance(&self, balance: Balance) {
        *self.balance.lock().unwrap() = balance;
    }

    /// Make subsequent order submissions fail.
    pub fn set_reject_orders(&self, reject: bool) {
        self.reject_orders.store(reject, Ordering::SeqCst);
    }

    /// Make subsequent top-of-book queries fail.
    pub fn set_fail_books(&self, fail: bool) {
        self.fail_books.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent balance queries fail.
    pub fn set_fail_balances(&self, fail: bool) {
        self.fail_balances.store(fail, Ordering::SeqCst);
    }

    /// All orders accepted so far.
    pub fn submissions(&self) -> Vec<SubmittedOrder> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeAdapter for PaperVenue {
    fn name(&self) -> VenueId {
        self.name.clone()
    }

    fn fee_deduction(&self) -> Decimal {
        self.fee_deduction
    }

    fn withdrawal_fee(&self) -> Decimal {
        self.withdrawal_fee
    }

    fn volume_precision(&self) -> u32 {
        self.volume_precision
    }

    async fn top_of_book(&self) -> Result<TopOfBook, VenueError> {
        if self.fail_books.load(Ordering::SeqCst) {
            return Err(VenueError::BookUnavailable {
                venue: self.name.clone(),
                reason: "scripted failure".to_string(),
            });
        }

        let bid = true_top_of_book(&self.bids.lock().unwrap(), self.fake_order_threshold);
        let ask = true_top_of_book(&self.asks.lock().unwrap(), self.fake_order_threshold);

        match (bid, ask) {
            (Some(bid), Some(ask)) => Ok(TopOfBook { bid, ask }),
            _ => Err(VenueError::BookUnavailable {
                venue: self.name.clone(),
                reason: "empty book".to_string(),
            }),
        }
    }

    async fn balances(&self) -> Result<Balance, VenueError> {
        if self.fail_balances.load(Ordering::SeqCst) {
            return Err(VenueError::BalanceUnavailable {
                venue: self.name.clone(),
                reason: "scripted failure".to_string(),
            });
        }

        Ok(*self.balance.lock().unwrap())
    }

    async fn submit_order(
        &self,
        side: Side,
        price: Decimal,
        volume: Decimal,
    ) -> Result<(), VenueError> {
        if self.reject_orders.load(Ordering::SeqCst) {
            return Err(VenueError::OrderRejected {
                venue: self.name.clone(),
                reason: "scripted rejection".to_string(),
            });
        }

        let mut balance = self.balance.lock().unwrap();
        match side {
            Side::Buy => {
                balance.quote -= price * volume;
                balance.base += volume;
            }
            Side::Sell => {
                balance.base -= volume;
                balance.quote += price * volume;
            }
        }
        drop(balance);

        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        self.open.lock().unwrap().push(OpenOrder {
            id: format!("paper-{id}"),
            side,
            price,
            volume,
        });
        self.submissions
            .lock()
            .unwrap()
            .push(SubmittedOrder { side, price, volume });

        Ok(())
    }

    async fn open_orders(&self) -> Result<Vec<OpenOrder>, VenueError> {
        Ok(self.open.lock().unwrap().clone())
    }
}

/// Builder for paper venues with common seeding patterns.
pub struct PaperVenueBuilder {
    name: VenueId,
    fee_deduction: Decimal,
    withdrawal_fee: Decimal,
    volume_precision: u32,
    fake_order_threshold: Decimal,
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
    balance: Balance,
    fail_books: bool,
    fail_balances: bool,
    reject_orders: bool,
}

impl PaperVenueBuilder {
    /// Start a builder for the named venue.
    pub fn new(name: impl Into<VenueId>) -> Self {
        Self {
            name: name.into(),
            fee_deduction: Decimal::ZERO,
            withdrawal_fee: Decimal::ZERO,
            volume_precision: 5,
            fake_order_threshold: Decimal::new(10, 0),
            bids: Vec::new(),
            asks: Vec::new(),
            balance: Balance::default(),
            fail_books: false,
            fail_balances: false,
            reject_orders: false,
        }
    }

    /// Set the fee-deduction fraction.
    pub fn fee_deduction(mut self, fee: Decimal) -> Self {
        self.fee_deduction = fee;
        self
    }

    /// Set the withdrawal-fee fraction.
    pub fn withdrawal_fee(mut self, fee: Decimal) -> Self {
        self.withdrawal_fee = fee;
        self
    }

    /// Set the accepted volume precision.
    pub fn volume_precision(mut self, dp: u32) -> Self {
        self.volume_precision = dp;
        self
    }

    /// Set the wall-order threshold used by sanitization.
    pub fn fake_order_threshold(mut self, threshold: Decimal) -> Self {
        self.fake_order_threshold = threshold;
        self
    }

    /// Add a bid level (call in best-first order).
    pub fn bid(mut self, price: Decimal, volume: Decimal) -> Self {
        self.bids.push(PriceLevel::new(price, volume));
        self
    }

    /// Add an ask level (call in best-first order).
    pub fn ask(mut self, price: Decimal, volume: Decimal) -> Self {
        self.asks.push(PriceLevel::new(price, volume));
        self
    }

    /// Seed the account balance.
    pub fn balance(mut self, quote: Decimal, base: Decimal) -> Self {
        self.balance = Balance::new(quote, base);
        self
    }

    /// Script top-of-book queries to fail.
    pub fn fail_books(mut self) -> Self {
        self.fail_books = true;
        self
    }

    /// Script balance queries to fail.
    pub fn fail_balances(mut self) -> Self {
        self.fail_balances = true;
        self
    }

    /// Script order submissions to be rejected.
    pub fn reject_orders(mut self) -> Self {
        self.reject_orders = true;
        self
    }

    /// Build the venue.
    pub fn build(self) -> PaperVenue {
        PaperVenue {
            name: self.name,
            fee_deduction: self.fee_deduction,
            withdrawal_fee: self.withdrawal_fee,
            volume_precision: self.volume_precision,
            fake_order_threshold: self.fake_order_threshold,
            bids: Mutex::new(self.bids),
            asks: Mutex::new(self.asks),
            balance: Mutex::new(self.balance),
            open: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            fail_books: AtomicBool::new(self.fail_books),
            fail_balances: AtomicBool::new(self.fail_balances),
            reject_orders: AtomicBool::new(self.reject_orders),
            next_order_id: AtomicU64::new(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn top_of_book_is_sanitized() {
        let venue = PaperVenueBuilder::new("alpha")
            .fake_order_threshold(dec!(10))
            .bid(dec!(1.00), dec!(2))
            .bid(dec!(0.99), dec!(20))
            .ask(dec!(1.02), dec!(50))
            .build();

        let top = venue.top_of_book().await.unwrap();
        // Thin best bid is walked past, deep best ask is kept.
        assert_eq!(top.bid, PriceLevel::new(dec!(0.99), dec!(22)));
        assert_eq!(top.ask, PriceLevel::new(dec!(1.02), dec!(50)));
    }

    #[tokio::test]
    async fn empty_book_is_unavailable() {
        let venue = PaperVenueBuilder::new("alpha").build();
        assert!(matches!(
            venue.top_of_book().await,
            Err(VenueError::BookUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn buy_moves_quote_into_base() {
        let venue = PaperVenueBuilder::new("alpha")
            .balance(dec!(1000), dec!(0))
            .build();

        venue
            .submit_order(Side::Buy, dec!(2), dec!(100))
            .await
            .unwrap();

        let balance = venue.balances().await.unwrap();
        assert_eq!(balance, Balance::new(dec!(800), dec!(100)));
        assert_eq!(venue.submissions().len(), 1);
        assert_eq!(venue.open_orders().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn scripted_rejection_records_nothing() {
        let venue = PaperVenueBuilder::new("alpha")
            .balance(dec!(1000), dec!(0))
            .reject_orders()
            .build();

        let result = venue.submit_order(Side::Buy, dec!(2), dec!(100)).await;
        assert!(matches!(result, Err(VenueError::OrderRejected { .. })));
        assert!(venue.submissions().is_empty());
        assert_eq!(venue.balances().await.unwrap(), Balance::new(dec!(1000), dec!(0)));
    }

    #[tokio::test]
    async fn failure_flags_can_be_toggled() {
        let venue = PaperVenueBuilder::new("alpha")
            .bid(dec!(1.00), dec!(100))
            .ask(dec!(1.02), dec!(100))
            .fail_books()
            .build();

        assert!(venue.top_of_book().await.is_err());
        venue.set_fail_books(false);
        assert!(venue.top_of_book().await.is_ok());
    }
}
