//! Long-lived per-venue order-book fetcher.
//!
//! One fetcher task per venue keeps that venue's snapshot as fresh as
//! possible without ever stopping, even under permanent adapter failure.
//! A dead venue is detected by the supervisor watching the task set, not by
//! the fetcher terminating.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use time::OffsetDateTime;
use tracing::{debug, warn};

use super::store::BookStore;
use crate::config::Config;
use crate::error::VenueError;
use crate::metrics;
use crate::venue::ExchangeAdapter;

/// Timing parameters for one fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Sleep between polls.
    pub fetch_interval: Duration,
    /// An unchanged quote re-served after this long still bumps the
    /// snapshot timestamp (liveness, not staleness).
    pub min_update_interval: Duration,
    /// Snapshot age past which the fetcher warns, at most once per window.
    pub unresponsive_tolerance: Duration,
    /// Ceiling on one top-of-book call.
    pub adapter_timeout: Duration,
}

impl FetcherConfig {
    /// Derive fetcher timing from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            fetch_interval: config.fetch_interval(),
            min_update_interval: config.min_update_interval(),
            unresponsive_tolerance: config.unresponsive_tolerance(),
            adapter_timeout: config.adapter_timeout(),
        }
    }
}

/// Counters exposed by a fetcher for supervision and tests.
#[derive(Debug, Default)]
pub struct FetcherStats {
    /// Successful top-of-book fetches.
    pub fetches: AtomicU64,
    /// Failed top-of-book fetches.
    pub errors: AtomicU64,
    /// Unresponsive-venue warnings emitted.
    pub stale_warnings: AtomicU64,
}

/// Poll loop keeping one venue's snapshot fresh.
pub struct BookFetcher {
    adapter: Arc<dyn ExchangeAdapter>,
    store: Arc<BookStore>,
    config: FetcherConfig,
    stats: Arc<FetcherStats>,
    last_warned: Option<Instant>,
}

impl BookFetcher {
    /// Create a fetcher for one venue.
    pub fn new(
        adapter: Arc<dyn ExchangeAdapter>,
        store: Arc<BookStore>,
        config: FetcherConfig,
    ) -> Self {
        Self {
            adapter,
            store,
            config,
            stats: Arc::new(FetcherStats::default()),
            last_warned: None,
        }
    }

    /// Shared handle to this fetcher's counters.
    pub fn stats(&self) -> Arc<FetcherStats> {
        Arc::clone(&self.stats)
    }

    /// Run forever. Errors are absorbed; only task abort or panic ends the
    /// loop.
    pub async fn run(mut self) {
        loop {
            self.poll_once().await;
            tokio::time::sleep(self.config.fetch_interval).await;
        }
    }

    async fn poll_once(&mut self) {
        let venue = self.adapter.name();
        let start = Instant::now();

        let result = tokio::time::timeout(self.config.adapter_timeout, self.adapter.top_of_book())
            .await
            .unwrap_or_else(|_| {
                Err(VenueError::BookUnavailable {
                    venue: venue.clone(),
                    reason: "top-of-book query timed out".to_string(),
                })
            });
        let now = OffsetDateTime::now_utc();

        match result {
            Ok(top) => {
                metrics::record_book_fetch_latency(start, &venue);
                metrics::inc_book_fetches(&venue);
                self.stats.fetches.fetch_add(1, Ordering::SeqCst);

                match self.store.get(&venue) {
                    Some(current) if current.same_prices(&top) => {
                        // The venue echoing the same quote inside its
                        // expected cadence is liveness, not staleness.
                        if current.age_secs(now) > self.config.min_update_interval.as_secs_f64() {
                            self.store.touch(&venue, now);
                        }
                    }
                    _ => self.store.replace(&venue, top, now),
                }
            }
            Err(err) => {
                metrics::inc_book_fetch_errors(&venue);
                self.stats.errors.fetch_add(1, Ordering::SeqCst);
                debug!(venue = %venue, error = %err, "book fetch failed");

                let age_secs = self
                    .store
                    .get(&venue)
                    .map(|snapshot| snapshot.age_secs(now))
                    .unwrap_or(f64::INFINITY);

                if age_secs > self.config.unresponsive_tolerance.as_secs_f64()
                    && self.warn_window_elapsed()
                {
                    warn!(
                        venue = %venue,
                        age_secs,
                        error = %err,
                        "venue receives no update; keeping last snapshot"
                    );
                    self.stats.stale_warnings.fetch_add(1, Ordering::SeqCst);
                    self.last_warned = Some(Instant::now());
                }
            }
        }
    }

    fn warn_window_elapsed(&self) -> bool {
        self.last_warned
            .map_or(true, |at| at.elapsed() >= self.config.unresponsive_tolerance)
    }
}
