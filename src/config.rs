//! Application configuration loaded from environment variables.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Trading Parameters ===
    /// Minimum net profit fraction (after the buyer's fee deduction) that
    /// triggers a trade (e.g. 0.02 = 2%).
    #[serde(default = "default_profit_threshold")]
    pub profit_threshold: Decimal,

    /// Smallest tradable volume in base-asset units.
    #[serde(default = "default_min_trade_volume")]
    pub min_trade_volume: Decimal,

    /// Volume left resting in a price level so the book is never rounded
    /// down to zero under our own order.
    #[serde(default = "default_listing_buffer")]
    pub listing_buffer: Decimal,

    /// Quote-currency balance held back from being spent.
    #[serde(default = "default_quote_reserve")]
    pub quote_reserve: Decimal,

    /// Base-asset balance held back from being sold.
    #[serde(default = "default_base_reserve")]
    pub base_reserve: Decimal,

    /// Cumulative-volume threshold above which a resting order is considered
    /// genuinely executable (wall-order filter).
    #[serde(default = "default_fake_order_threshold")]
    pub fake_order_threshold: Decimal,

    // === Freshness Windows ===
    /// Maximum age of an order-book snapshot before it is untrusted.
    #[serde(default = "default_book_valid_window_secs")]
    pub book_valid_window_secs: u64,

    /// Maximum skew between two venues' snapshot timestamps for them to be
    /// compared against each other.
    #[serde(default = "default_sync_tolerance_secs")]
    pub sync_tolerance_secs: u64,

    /// An unchanged quote re-served within this interval counts as liveness
    /// and bumps the snapshot timestamp.
    #[serde(default = "default_min_update_interval_secs")]
    pub min_update_interval_secs: u64,

    /// Snapshot age past which a fetcher warns that its venue is
    /// unresponsive.
    #[serde(default = "default_unresponsive_tolerance_secs")]
    pub unresponsive_tolerance_secs: u64,

    // === Cadence ===
    /// Sleep between order-book polls, per venue.
    #[serde(default = "default_fetch_interval_ms")]
    pub fetch_interval_ms: u64,

    /// Sleep between decision-loop ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Wall-clock interval for forced balance refreshes (catches external
    /// transfers).
    #[serde(default = "default_balance_refresh_secs")]
    pub balance_refresh_secs: u64,

    /// Ceiling on any single adapter network call.
    #[serde(default = "default_adapter_timeout_secs")]
    pub adapter_timeout_secs: u64,

    // === Server Configuration ===
    /// HTTP server port for health/metrics endpoints.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_profit_threshold() -> Decimal {
    Decimal::new(2, 2) // 0.02
}

fn default_min_trade_volume() -> Decimal {
    Decimal::new(500, 0)
}

fn default_listing_buffer() -> Decimal {
    Decimal::new(1000, 0)
}

fn default_quote_reserve() -> Decimal {
    Decimal::new(50, 0)
}

fn default_base_reserve() -> Decimal {
    Decimal::new(100, 0)
}

fn default_fake_order_threshold() -> Decimal {
    Decimal::new(10, 0)
}

fn default_book_valid_window_secs() -> u64 {
    4
}

fn default_sync_tolerance_secs() -> u64 {
    4
}

fn default_min_update_interval_secs() -> u64 {
    1
}

fn default_unresponsive_tolerance_secs() -> u64 {
    10
}

fn default_fetch_interval_ms() -> u64 {
    500
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_balance_refresh_secs() -> u64 {
    300
}

fn default_adapter_timeout_secs() -> u64 {
    5
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.profit_threshold <= Decimal::ZERO {
            return Err("PROFIT_THRESHOLD must be positive".to_string());
        }

        if self.min_trade_volume <= Decimal::ZERO {
            return Err("MIN_TRADE_VOLUME must be positive".to_string());
        }

        if self.listing_buffer < Decimal::ZERO {
            return Err("LISTING_BUFFER must not be negative".to_string());
        }

        if self.book_valid_window_secs <= self.min_update_interval_secs {
            return Err(
                "BOOK_VALID_WINDOW_SECS must exceed MIN_UPDATE_INTERVAL_SECS".to_string(),
            );
        }

        if self.tick_interval_ms == 0 || self.fetch_interval_ms == 0 {
            return Err("TICK_INTERVAL_MS and FETCH_INTERVAL_MS must be positive".to_string());
        }

        Ok(())
    }

    /// Maximum order-book snapshot age before it is untrusted.
    pub fn book_valid_window(&self) -> Duration {
        Duration::from_secs(self.book_valid_window_secs)
    }

    /// Maximum skew between two venues' snapshot timestamps.
    pub fn sync_tolerance(&self) -> Duration {
        Duration::from_secs(self.sync_tolerance_secs)
    }

    /// Liveness bump interval for unchanged quotes.
    pub fn min_update_interval(&self) -> Duration {
        Duration::from_secs(self.min_update_interval_secs)
    }

    /// Snapshot age past which a fetcher warns.
    pub fn unresponsive_tolerance(&self) -> Duration {
        Duration::from_secs(self.unresponsive_tolerance_secs)
    }

    /// Sleep between order-book polls.
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_millis(self.fetch_interval_ms)
    }

    /// Sleep between decision-loop ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Forced balance-refresh interval.
    pub fn balance_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.balance_refresh_secs)
    }

    /// Ceiling on any single adapter network call.
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profit_threshold: default_profit_threshold(),
            min_trade_volume: default_min_trade_volume(),
            listing_buffer: default_listing_buffer(),
            quote_reserve: default_quote_reserve(),
            base_reserve: default_base_reserve(),
            fake_order_threshold: default_fake_order_threshold(),
            book_valid_window_secs: default_book_valid_window_secs(),
            sync_tolerance_secs: default_sync_tolerance_secs(),
            min_update_interval_secs: default_min_update_interval_secs(),
            unresponsive_tolerance_secs: default_unresponsive_tolerance_secs(),
            fetch_interval_ms: default_fetch_interval_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            balance_refresh_secs: default_balance_refresh_secs(),
            adapter_timeout_secs: default_adapter_timeout_secs(),
            port: default_port(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_values_are_sensible() {
        let config = Config::default();
        assert_eq!(config.profit_threshold, dec!(0.02));
        assert_eq!(config.min_trade_volume, dec!(500));
        assert_eq!(config.listing_buffer, dec!(1000));
        assert_eq!(config.fake_order_threshold, dec!(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_positive_threshold() {
        let config = Config {
            profit_threshold: Decimal::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_valid_window_below_update_interval() {
        let config = Config {
            book_valid_window_secs: 1,
            min_update_interval_secs: 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn duration_accessors_convert_units() {
        let config = Config::default();
        assert_eq!(config.book_valid_window(), Duration::from_secs(4));
        assert_eq!(config.fetch_interval(), Duration::from_millis(500));
        assert_eq!(config.balance_refresh_interval(), Duration::from_secs(300));
    }
}
