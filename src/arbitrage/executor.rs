//! Two-legged order execution with partial-failure handling.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{error, info, instrument};

use super::detector::TransactionClock;
use crate::balance::BalanceTracker;
use crate::error::VenueError;
use crate::metrics;
use crate::notify::Notifier;
use crate::venue::{ExchangeAdapter, Side, VenueId};

/// A fully sized two-venue arbitrage trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradePlan {
    /// Venue to buy on.
    pub buyer: VenueId,
    /// Venue to sell on.
    pub seller: VenueId,
    /// Buy limit price (the buyer venue's ask).
    pub buy_price: Decimal,
    /// Buy volume.
    pub buy_volume: Decimal,
    /// Sell limit price (the seller venue's bid).
    pub sell_price: Decimal,
    /// Sell volume (post withdrawal fee and safety margin).
    pub sell_volume: Decimal,
}

/// Terminal outcome of an execution attempt.
#[derive(Debug)]
pub enum ExecutionResult {
    /// Both legs were accepted by their venues (acceptance, not fill).
    Placed,
    /// The buy leg failed; the sell leg was never attempted, so no naked
    /// short position was entered.
    BuyFailed(VenueError),
    /// The buy leg was accepted but the sell leg failed. The position is
    /// left unhedged; there is no compensating action available, so the
    /// notification channel is the recovery mechanism.
    SellFailed(VenueError),
}

impl ExecutionResult {
    /// Whether both legs were placed.
    pub fn is_placed(&self) -> bool {
        matches!(self, ExecutionResult::Placed)
    }
}

/// Submits the two legs of a sized trade, always buy-then-sell.
#[derive(Debug)]
pub struct OrderExecutor {
    notifier: Notifier,
    adapter_timeout: Duration,
}

impl OrderExecutor {
    /// Create an executor.
    pub fn new(notifier: Notifier, adapter_timeout: Duration) -> Self {
        Self {
            notifier,
            adapter_timeout,
        }
    }

    /// Execute a sized trade.
    ///
    /// Both venues' balances are marked dirty and both transaction clocks
    /// are bumped *before* either leg is attempted: a failed or in-flight
    /// order still invalidates reuse of the pre-trade quotes.
    #[instrument(skip(self, buyer, seller, plan, clock, balances), fields(buyer = %plan.buyer, seller = %plan.seller))]
    pub async fn execute(
        &self,
        buyer: &Arc<dyn ExchangeAdapter>,
        seller: &Arc<dyn ExchangeAdapter>,
        plan: &TradePlan,
        clock: &mut TransactionClock,
        balances: &BalanceTracker,
        now: OffsetDateTime,
    ) -> ExecutionResult {
        balances.mark_dirty();
        clock.bump(&plan.buyer, now);
        clock.bump(&plan.seller, now);

        if let Err(err) = self
            .submit_leg(buyer, Side::Buy, plan.buy_price, plan.buy_volume)
            .await
        {
            error!(venue = %plan.buyer, error = %err, "unable to place buy leg");
            self.notifier.notify(format!(
                "Arbitrage aborted: buy on {} at {}, volume {} failed: {}",
                plan.buyer, plan.buy_price, plan.buy_volume, err
            ));
            return ExecutionResult::BuyFailed(err);
        }
        info!(
            venue = %plan.buyer,
            price = %plan.buy_price,
            volume = %plan.buy_volume,
            "arbitrage buy leg placed"
        );

        if let Err(err) = self
            .submit_leg(seller, Side::Sell, plan.sell_price, plan.sell_volume)
            .await
        {
            error!(venue = %plan.seller, error = %err, "unable to place sell leg");
            self.notifier.notify(format!(
                "Arbitrage unhedged: bought volume {} on {} at {}, but sell on {} at {}, volume {} failed: {}",
                plan.buy_volume,
                plan.buyer,
                plan.buy_price,
                plan.seller,
                plan.sell_price,
                plan.sell_volume,
                err
            ));
            return ExecutionResult::SellFailed(err);
        }
        info!(
            venue = %plan.seller,
            price = %plan.sell_price,
            volume = %plan.sell_volume,
            "arbitrage sell leg placed"
        );

        metrics::inc_trades_executed();
        self.notifier.notify(format!(
            "Arbitrage: purchase from {} at {}, volume: {}\nArbitrage: sell to {} at {}, volume: {}",
            plan.buyer, plan.buy_price, plan.buy_volume, plan.seller, plan.sell_price, plan.sell_volume
        ));

        ExecutionResult::Placed
    }

    async fn submit_leg(
        &self,
        venue: &Arc<dyn ExchangeAdapter>,
        side: Side,
        price: Decimal,
        volume: Decimal,
    ) -> Result<(), VenueError> {
        let name = venue.name();
        let start = Instant::now();

        let result = tokio::time::timeout(self.adapter_timeout, venue.submit_order(side, price, volume))
            .await
            .unwrap_or_else(|_| {
                Err(VenueError::OrderRejected {
                    venue: name.clone(),
                    reason: "order submission timed out".to_string(),
                })
            });

        metrics::record_order_submit_latency(start, &name);
        match &result {
            Ok(()) => metrics::inc_orders_submitted(&name),
            Err(_) => metrics::inc_orders_failed(&name),
        }
        result
    }
}
