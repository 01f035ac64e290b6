//! Prometheus metrics for the arbitrage engine.
//!
//! Covers order-book fetching, the decision loop, order submission and
//! balance refreshes.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Order-book fetch latency metric name.
pub const METRIC_BOOK_FETCH_LATENCY: &str = "book_fetch_latency_ms";
/// Decision-tick latency metric name.
pub const METRIC_TICK_LATENCY: &str = "tick_latency_ms";
/// Order submission latency metric name.
pub const METRIC_ORDER_SUBMIT_LATENCY: &str = "order_submit_latency_ms";
/// Order-book fetches counter metric name.
pub const METRIC_BOOK_FETCHES: &str = "book_fetches_total";
/// Order-book fetch errors counter metric name.
pub const METRIC_BOOK_FETCH_ERRORS: &str = "book_fetch_errors_total";
/// Opportunities detected counter metric name.
pub const METRIC_OPPORTUNITIES_DETECTED: &str = "opportunities_detected_total";
/// Orders submitted counter metric name.
pub const METRIC_ORDERS_SUBMITTED: &str = "orders_submitted_total";
/// Orders failed counter metric name.
pub const METRIC_ORDERS_FAILED: &str = "orders_failed_total";
/// Completed two-leg trades counter metric name.
pub const METRIC_TRADES_EXECUTED: &str = "trades_executed_total";
/// Ticks skipped on unknown balances counter metric name.
pub const METRIC_TICKS_SKIPPED: &str = "ticks_skipped_total";
/// Balance refresh failures counter metric name.
pub const METRIC_BALANCE_REFRESH_FAILURES: &str = "balance_refresh_failures_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_BOOK_FETCH_LATENCY,
        "Order-book fetch latency in milliseconds"
    );
    describe_histogram!(
        METRIC_TICK_LATENCY,
        "Decision-loop tick latency in milliseconds"
    );
    describe_histogram!(
        METRIC_ORDER_SUBMIT_LATENCY,
        "Order submission latency in milliseconds"
    );

    describe_counter!(METRIC_BOOK_FETCHES, "Total number of order-book fetches");
    describe_counter!(
        METRIC_BOOK_FETCH_ERRORS,
        "Total number of failed order-book fetches"
    );
    describe_counter!(
        METRIC_OPPORTUNITIES_DETECTED,
        "Total number of profitable venue pairs detected"
    );
    describe_counter!(METRIC_ORDERS_SUBMITTED, "Total number of orders submitted");
    describe_counter!(
        METRIC_ORDERS_FAILED,
        "Total number of order submissions that failed"
    );
    describe_counter!(
        METRIC_TRADES_EXECUTED,
        "Total number of two-leg arbitrage trades placed"
    );
    describe_counter!(
        METRIC_TICKS_SKIPPED,
        "Total number of decision ticks skipped on unknown balances"
    );
    describe_counter!(
        METRIC_BALANCE_REFRESH_FAILURES,
        "Total number of failed balance refreshes"
    );

    debug!("Metrics initialized");
}

/// Record order-book fetch latency for a venue.
pub fn record_book_fetch_latency(start: Instant, venue: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_BOOK_FETCH_LATENCY, "venue" => venue.to_string()).record(latency_ms);
}

/// Record decision-tick latency.
pub fn record_tick_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_TICK_LATENCY).record(latency_ms);
}

/// Record order submission latency for a venue.
pub fn record_order_submit_latency(start: Instant, venue: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_ORDER_SUBMIT_LATENCY, "venue" => venue.to_string()).record(latency_ms);
}

/// Increment the order-book fetches counter.
pub fn inc_book_fetches(venue: &str) {
    counter!(METRIC_BOOK_FETCHES, "venue" => venue.to_string()).increment(1);
}

/// Increment the order-book fetch errors counter.
pub fn inc_book_fetch_errors(venue: &str) {
    counter!(METRIC_BOOK_FETCH_ERRORS, "venue" => venue.to_string()).increment(1);
}

/// Increment the opportunities detected counter.
pub fn inc_opportunities_detected() {
    counter!(METRIC_OPPORTUNITIES_DETECTED).increment(1);
}

/// Increment the orders submitted counter.
pub fn inc_orders_submitted(venue: &str) {
    counter!(METRIC_ORDERS_SUBMITTED, "venue" => venue.to_string()).increment(1);
}

/// Increment the orders failed counter.
pub fn inc_orders_failed(venue: &str) {
    counter!(METRIC_ORDERS_FAILED, "venue" => venue.to_string()).increment(1);
}

/// Increment the trades executed counter.
pub fn inc_trades_executed() {
    counter!(METRIC_TRADES_EXECUTED).increment(1);
}

/// Increment the skipped-ticks counter.
pub fn inc_ticks_skipped() {
    counter!(METRIC_TICKS_SKIPPED).increment(1);
}

/// Increment the balance refresh failures counter.
pub fn inc_balance_refresh_failures() {
    counter!(METRIC_BALANCE_REFRESH_FAILURES).increment(1);
}
