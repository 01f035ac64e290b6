//! The supervised arbitrage decision loop.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use super::detector::{books_in_sync, find_counter_venue, is_book_valid, TransactionClock};
use super::executor::{ExecutionResult, OrderExecutor, TradePlan};
use super::sizer::{size_trade, SizingLimits, SizingOutcome};
use crate::api::AppState;
use crate::balance::{spawn_refresh_timer, BalanceTracker};
use crate::config::Config;
use crate::error::EngineError;
use crate::metrics;
use crate::notify::Notifier;
use crate::orderbook::{BookFetcher, BookStore, FetcherConfig, PriceLevel};
use crate::venue::{ExchangeAdapter, VenueId};

/// Decision-loop statistics, exposed through the status endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStats {
    /// Decision ticks run.
    pub ticks: u64,
    /// Ticks skipped because balances could not be refreshed.
    pub skipped_ticks: u64,
    /// Profitable venue pairs detected.
    pub opportunities_found: u64,
    /// Two-leg trades fully placed.
    pub trades_placed: u64,
    /// Buy legs that failed (no sell attempted).
    pub buy_failures: u64,
    /// Sell legs that failed after a successful buy.
    pub sell_failures: u64,
}

/// The arbitrage engine: per-venue fetchers, balance tracking and the
/// single-threaded decision loop that owns all trade intent.
pub struct Engine {
    venues: Vec<Arc<dyn ExchangeAdapter>>,
    store: Arc<BookStore>,
    balances: BalanceTracker,
    clock: TransactionClock,
    executor: OrderExecutor,
    notifier: Notifier,
    config: Config,
    limits: SizingLimits,
    stats: EngineStats,
    app_state: AppState,
}

impl Engine {
    /// Create an engine over the given venues. Seeds the book store, the
    /// balance tracker and the transaction clock with sentinels for every
    /// venue; entries live for the process lifetime.
    pub fn new(
        venues: Vec<Arc<dyn ExchangeAdapter>>,
        config: Config,
        notifier: Notifier,
        app_state: AppState,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        let names: Vec<VenueId> = venues.iter().map(|venue| venue.name()).collect();

        let store = Arc::new(BookStore::new());
        for name in &names {
            store.seed(name, now);
        }

        let balances = BalanceTracker::new(&names, config.adapter_timeout());
        let clock = TransactionClock::new(&names, now);
        let executor = OrderExecutor::new(notifier.clone(), config.adapter_timeout());
        let limits = SizingLimits::from_config(&config);

        Self {
            venues,
            store,
            balances,
            clock,
            executor,
            notifier,
            config,
            limits,
            stats: EngineStats::default(),
            app_state,
        }
    }

    /// Shared handle to the order-book store.
    pub fn store(&self) -> Arc<BookStore> {
        Arc::clone(&self.store)
    }

    /// Current statistics.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Run one decision tick at `now`.
    pub async fn tick(&mut self, now: OffsetDateTime) -> crate::Result<()> {
        let start = Instant::now();
        self.stats.ticks += 1;

        // No decisions are made on unknown balances.
        if self.balances.needs_refresh() {
            if let Err(err) = self.balances.refresh(&self.venues).await {
                warn!(error = %err, "failed to update account balances; skipping tick");
                self.stats.skipped_ticks += 1;
                metrics::inc_ticks_skipped();
                self.push_stats().await;
                return Ok(());
            }
        }

        for idx in 0..self.venues.len() {
            self.consider_buyer(idx, now).await;
        }

        metrics::record_tick_latency(start);
        self.push_stats().await;
        Ok(())
    }

    /// Evaluate one venue as the prospective buyer.
    async fn consider_buyer(&mut self, buyer_idx: usize, now: OffsetDateTime) {
        let buyer = Arc::clone(&self.venues[buyer_idx]);
        let buyer_name = buyer.name();

        let Some(buyer_book) = self.store.get(&buyer_name) else {
            return;
        };
        let Some(buyer_last_tx) = self.clock.get(&buyer_name) else {
            return;
        };
        if !is_book_valid(&buyer_book, buyer_last_tx, now, self.config.book_valid_window()) {
            debug!(venue = %buyer_name, "buyer order book not valid this tick");
            return;
        }

        let mut candidates: Vec<(VenueId, PriceLevel)> = Vec::new();
        for venue in &self.venues {
            let name = venue.name();
            if name == buyer_name {
                continue;
            }
            let Some(book) = self.store.get(&name) else {
                continue;
            };
            let Some(last_tx) = self.clock.get(&name) else {
                continue;
            };
            if is_book_valid(&book, last_tx, now, self.config.book_valid_window())
                && books_in_sync(&buyer_book, &book, self.config.sync_tolerance())
            {
                candidates.push((name, book.bid));
            }
        }

        let Some(opportunity) = find_counter_venue(
            &buyer_book.ask,
            buyer.fee_deduction(),
            &candidates,
            self.config.profit_threshold,
        ) else {
            return;
        };

        self.stats.opportunities_found += 1;
        metrics::inc_opportunities_detected();
        info!(
            buyer = %buyer_name,
            seller = %opportunity.seller,
            profit = %opportunity.profit,
            "found profitable venue pair"
        );

        let Some(seller) = self
            .venues
            .iter()
            .find(|venue| venue.name() == opportunity.seller)
            .cloned()
        else {
            return;
        };
        let Some(buyer_balance) = self.balances.get(&buyer_name) else {
            return;
        };
        let Some(seller_balance) = self.balances.get(&opportunity.seller) else {
            return;
        };

        match size_trade(
            &buyer_book.ask,
            &opportunity.seller_bid,
            &buyer_balance,
            &seller_balance,
            buyer.withdrawal_fee(),
            buyer.volume_precision(),
            &self.limits,
        ) {
            SizingOutcome::Sized {
                purchase_volume,
                sell_volume,
            } => {
                let plan = TradePlan {
                    buyer: buyer_name,
                    seller: opportunity.seller,
                    buy_price: buyer_book.ask.price,
                    buy_volume: purchase_volume,
                    sell_price: opportunity.seller_bid.price,
                    sell_volume,
                };
                let result = self
                    .executor
                    .execute(&buyer, &seller, &plan, &mut self.clock, &self.balances, now)
                    .await;
                match result {
                    ExecutionResult::Placed => self.stats.trades_placed += 1,
                    ExecutionResult::BuyFailed(_) => self.stats.buy_failures += 1,
                    ExecutionResult::SellFailed(_) => self.stats.sell_failures += 1,
                }
            }
            SizingOutcome::InsufficientLiquidity { available } => {
                debug!(
                    buyer = %buyer_name,
                    seller = %opportunity.seller,
                    available = %available,
                    "not enough executable volume"
                );
            }
            SizingOutcome::InsufficientBuyerFunds => {
                info!(venue = %buyer_name, "insufficient funds on buyer account");
            }
            SizingOutcome::InsufficientSellerFunds => {
                info!(venue = %opportunity.seller, "insufficient funds on seller account");
            }
            SizingOutcome::BelowMinimum { sell_volume } => {
                info!(sell_volume = %sell_volume, "under minimum arbitrage volume");
            }
        }
    }

    /// Spawn the per-venue fetchers and the balance-refresh timer, then run
    /// the decision loop until every fetcher is dead.
    ///
    /// A single dead venue is tolerated indefinitely (its books simply stay
    /// invalid); losing every fetcher means the engine is blind and must
    /// exit rather than keep deciding on sentinel data.
    pub async fn run(mut self) -> crate::Result<()> {
        let fetcher_config = FetcherConfig::from_config(&self.config);
        let mut fetchers = Vec::with_capacity(self.venues.len());
        for venue in &self.venues {
            info!(venue = %venue.name(), "starting order-book fetcher");
            let fetcher = BookFetcher::new(
                Arc::clone(venue),
                Arc::clone(&self.store),
                fetcher_config.clone(),
            );
            fetchers.push(tokio::spawn(fetcher.run()));
        }

        let timer = spawn_refresh_timer(
            self.balances.refresh_flag(),
            self.config.balance_refresh_interval(),
        );

        self.app_state.set_ready(true);
        info!(venues = self.venues.len(), "arbitrage engine engaged");

        loop {
            if fetchers.iter().all(|handle| handle.is_finished()) {
                error!("all order-book fetchers terminated; the engine cannot operate blind");
                self.notifier
                    .notify("Arbitrage engine terminated: all order-book fetchers died");
                self.app_state.set_ready(false);
                timer.abort();
                return Err(EngineError::FetchersDead);
            }

            let now = OffsetDateTime::now_utc();
            if let Err(err) = self.tick(now).await {
                error!(error = %err, "unexpected error in decision tick");
            }

            tokio::time::sleep(self.config.tick_interval()).await;
        }
    }

    async fn push_stats(&self) {
        *self.app_state.stats.write().await = self.stats.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingSink;
    use crate::venue::{PaperVenue, PaperVenueBuilder, Side};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn test_config() -> Config {
        Config {
            profit_threshold: dec!(0.02),
            min_trade_volume: dec!(500),
            listing_buffer: dec!(1000),
            quote_reserve: dec!(50),
            base_reserve: dec!(100),
            ..Config::default()
        }
    }

    /// Buyer venue with a cheap ask, seller venue with an expensive bid.
    fn profitable_pair() -> (Arc<PaperVenue>, Arc<PaperVenue>) {
        let alpha = Arc::new(
            PaperVenueBuilder::new("alpha")
                .fee_deduction(dec!(0.01))
                .bid(dec!(0.98), dec!(5000))
                .ask(dec!(1.00), dec!(5000))
                .balance(dec!(10000), dec!(10000))
                .build(),
        );
        let beta = Arc::new(
            PaperVenueBuilder::new("beta")
                .fee_deduction(dec!(0.01))
                .bid(dec!(1.05), dec!(5000))
                .ask(dec!(1.07), dec!(5000))
                .balance(dec!(10000), dec!(10000))
                .build(),
        );
        (alpha, beta)
    }

    fn test_engine(
        venues: Vec<Arc<dyn ExchangeAdapter>>,
        config: Config,
    ) -> (Engine, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let (notifier, _handle) = Notifier::spawn(sink.clone());
        let engine = Engine::new(venues, config, notifier, AppState::new());
        (engine, sink)
    }

    /// Push both venues' current books into the store with a timestamp
    /// strictly after engine construction, making them valid and in sync.
    async fn refresh_books(engine: &Engine, venues: &[Arc<PaperVenue>]) {
        tokio::time::sleep(Duration::from_millis(2)).await;
        let now = OffsetDateTime::now_utc();
        let store = engine.store();
        for venue in venues {
            let top = venue.top_of_book().await.unwrap();
            store.replace(&venue.name(), top, now);
        }
    }

    #[tokio::test]
    async fn trade_fires_on_profitable_spread() {
        let (alpha, beta) = profitable_pair();
        let (mut engine, sink) = test_engine(
            vec![alpha.clone() as _, beta.clone() as _],
            test_config(),
        );

        refresh_books(&engine, &[alpha.clone(), beta.clone()]).await;
        engine.tick(OffsetDateTime::now_utc()).await.unwrap();

        // alpha buys at its ask, beta sells at its bid.
        let buys = alpha.submissions();
        assert_eq!(buys.len(), 1);
        assert_eq!(buys[0].side, Side::Buy);
        assert_eq!(buys[0].price, dec!(1.00));
        // purchase = min(9950, 9900, 5000 - 1000) = 4000.
        assert_eq!(buys[0].volume, dec!(4000));

        let sells = beta.submissions();
        assert_eq!(sells.len(), 1);
        assert_eq!(sells[0].side, Side::Sell);
        assert_eq!(sells[0].price, dec!(1.05));
        assert_eq!(sells[0].volume, dec!(3999));

        assert_eq!(engine.stats().opportunities_found, 1);
        assert_eq!(engine.stats().trades_placed, 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(sink
            .messages()
            .iter()
            .any(|message| message.contains("purchase from alpha")));
    }

    #[tokio::test]
    async fn repeated_ticks_below_threshold_submit_nothing() {
        let (alpha, beta) = profitable_pair();
        // Pull beta's bid down to a 1% gross edge; net of the 1% fee this
        // is below the 2% threshold.
        beta.set_depth(
            vec![PriceLevel::new(dec!(1.01), dec!(5000))],
            vec![PriceLevel::new(dec!(1.07), dec!(5000))],
        );

        let (mut engine, _sink) = test_engine(
            vec![alpha.clone() as _, beta.clone() as _],
            test_config(),
        );
        refresh_books(&engine, &[alpha.clone(), beta.clone()]).await;

        for _ in 0..5 {
            engine.tick(OffsetDateTime::now_utc()).await.unwrap();
        }

        assert!(alpha.submissions().is_empty());
        assert!(beta.submissions().is_empty());
        assert_eq!(engine.stats().opportunities_found, 0);
        assert_eq!(engine.stats().ticks, 5);
    }

    #[tokio::test]
    async fn sentinel_books_are_never_traded_on() {
        let (alpha, beta) = profitable_pair();
        let (mut engine, _sink) = test_engine(
            vec![alpha.clone() as _, beta.clone() as _],
            test_config(),
        );

        // No fetch has happened: snapshots are sentinels whose timestamps
        // do not postdate the transaction clock.
        engine.tick(OffsetDateTime::now_utc()).await.unwrap();

        assert!(alpha.submissions().is_empty());
        assert!(beta.submissions().is_empty());
    }

    #[tokio::test]
    async fn stale_books_are_never_traded_on() {
        let (alpha, beta) = profitable_pair();
        let (mut engine, _sink) = test_engine(
            vec![alpha.clone() as _, beta.clone() as _],
            test_config(),
        );
        refresh_books(&engine, &[alpha.clone(), beta.clone()]).await;

        // Outside the freshness window nothing fires.
        let later = OffsetDateTime::now_utc() + time::Duration::seconds(10);
        engine.tick(later).await.unwrap();

        assert!(alpha.submissions().is_empty());
        assert!(beta.submissions().is_empty());
    }

    #[tokio::test]
    async fn tick_is_skipped_when_balances_cannot_refresh() {
        let (alpha, beta) = profitable_pair();
        alpha.set_fail_balances(true);

        let (mut engine, _sink) = test_engine(
            vec![alpha.clone() as _, beta.clone() as _],
            test_config(),
        );
        refresh_books(&engine, &[alpha.clone(), beta.clone()]).await;

        engine.tick(OffsetDateTime::now_utc()).await.unwrap();

        assert_eq!(engine.stats().skipped_ticks, 1);
        assert!(alpha.submissions().is_empty());
        assert!(beta.submissions().is_empty());
    }

    #[tokio::test]
    async fn desynchronized_counter_venue_is_ignored() {
        let (alpha, beta) = profitable_pair();
        let mut config = test_config();
        config.sync_tolerance_secs = 1;

        let (mut engine, _sink) =
            test_engine(vec![alpha.clone() as _, beta.clone() as _], config);

        // Both books are individually inside the 4s freshness window at the
        // tick, but 2s apart from each other: past the 1s sync tolerance.
        tokio::time::sleep(Duration::from_millis(2)).await;
        let now = OffsetDateTime::now_utc();
        let tick_at = now + time::Duration::seconds(2);
        let store = engine.store();
        let alpha_top = alpha.top_of_book().await.unwrap();
        let beta_top = beta.top_of_book().await.unwrap();
        store.replace("beta", beta_top, now);
        store.replace("alpha", alpha_top, tick_at);

        engine.tick(tick_at).await.unwrap();

        assert!(alpha.submissions().is_empty());
        assert!(beta.submissions().is_empty());
    }

    #[tokio::test]
    async fn engine_survives_permanently_failing_venues() {
        let (alpha, beta) = profitable_pair();
        alpha.set_fail_books(true);
        beta.set_fail_books(true);

        let mut config = test_config();
        config.fetch_interval_ms = 10;
        config.tick_interval_ms = 10;

        let (engine, _sink) = test_engine(vec![alpha as _, beta as _], config);
        let handle = tokio::spawn(engine.run());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test]
    async fn no_live_fetchers_is_fatal() {
        let (engine, sink) = test_engine(Vec::new(), test_config());

        let result = engine.run().await;
        assert!(matches!(result, Err(EngineError::FetchersDead)));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(sink
            .messages()
            .iter()
            .any(|message| message.contains("terminated")));
    }
}
