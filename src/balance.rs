//! Last-known per-venue account balances.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::VenueError;
use crate::venue::{ExchangeAdapter, VenueId};

/// Quote-currency and base-asset balances on one venue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Quote-currency balance.
    pub quote: Decimal,
    /// Base-asset balance.
    pub base: Decimal,
}

impl Balance {
    /// Create a balance.
    pub fn new(quote: Decimal, base: Decimal) -> Self {
        Self { quote, base }
    }
}

/// Holds last-known balances for every configured venue.
///
/// Mutated only by the decision loop. The `needs_refresh` flag is shared
/// with the periodic timer task and the order executor: any order attempt
/// or timer firing raises it, and it is cleared only by a refresh that
/// succeeded on *all* venues.
#[derive(Debug)]
pub struct BalanceTracker {
    balances: HashMap<VenueId, Balance>,
    needs_refresh: Arc<AtomicBool>,
    adapter_timeout: Duration,
}

impl BalanceTracker {
    /// Create a tracker with zero balances for the given venues. Starts
    /// dirty so the first tick fetches real balances before trading.
    pub fn new(venues: &[VenueId], adapter_timeout: Duration) -> Self {
        let balances = venues
            .iter()
            .map(|venue| (venue.clone(), Balance::default()))
            .collect();
        Self {
            balances,
            needs_refresh: Arc::new(AtomicBool::new(true)),
            adapter_timeout,
        }
    }

    /// Last-known balance for a venue.
    pub fn get(&self, venue: &str) -> Option<Balance> {
        self.balances.get(venue).copied()
    }

    /// Whether a refresh is currently needed.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh.load(Ordering::SeqCst)
    }

    /// Mark balances as dirty (capital may have moved).
    pub fn mark_dirty(&self) {
        self.needs_refresh.store(true, Ordering::SeqCst);
    }

    /// Shared handle to the dirty flag, for the refresh timer task.
    pub fn refresh_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.needs_refresh)
    }

    /// Refresh balances from every adapter.
    ///
    /// Results are staged and committed only if all venues succeed; any
    /// failure leaves previously known balances untouched and keeps the
    /// dirty flag raised.
    pub async fn refresh(
        &mut self,
        adapters: &[Arc<dyn ExchangeAdapter>],
    ) -> Result<(), VenueError> {
        let adapter_timeout = self.adapter_timeout;
        let queries = adapters.iter().map(|adapter| async move {
            let venue = adapter.name();
            let result = tokio::time::timeout(adapter_timeout, adapter.balances())
                .await
                .unwrap_or_else(|_| {
                    Err(VenueError::BalanceUnavailable {
                        venue: venue.clone(),
                        reason: "balance query timed out".to_string(),
                    })
                });
            (venue, result)
        });

        let mut staged: HashMap<VenueId, Balance> = HashMap::with_capacity(adapters.len());
        for (venue, result) in join_all(queries).await {
            match result {
                Ok(balance) => {
                    staged.insert(venue, balance);
                }
                Err(err) => {
                    crate::metrics::inc_balance_refresh_failures();
                    warn!(venue = %venue, error = %err, "balance refresh failed");
                    return Err(err);
                }
            }
        }

        self.balances.extend(staged);
        self.needs_refresh.store(false, Ordering::SeqCst);
        info!(balances = ?self.balances, "account balances updated");
        Ok(())
    }

    /// Refresh only if the dirty flag is raised.
    pub async fn refresh_if_needed(
        &mut self,
        adapters: &[Arc<dyn ExchangeAdapter>],
    ) -> Result<(), VenueError> {
        if self.needs_refresh() {
            self.refresh(adapters).await
        } else {
            Ok(())
        }
    }
}

/// Spawn the periodic task that raises the dirty flag, so external
/// transfers are eventually picked up even without trading activity.
pub fn spawn_refresh_timer(flag: Arc<AtomicBool>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick of a tokio interval fires immediately; the tracker
        // already starts dirty, so swallow it.
        interval.tick().await;
        loop {
            interval.tick().await;
            debug!("scheduled balance check requested");
            flag.store(true, Ordering::SeqCst);
        }
    })
}
