//! Liquidity sanitization: recover the "true" top of book.
//!
//! Some venues show artificially large resting orders ("walls") that are not
//! genuinely executable at depth. Walking the depth list and accumulating
//! volume until it crosses a threshold yields a price that is pessimistic
//! about fill (slippage-aware) but realistic about available size.

use rust_decimal::Decimal;

use super::types::PriceLevel;

/// Reduce a depth-ordered level list (best price first) to a single
/// executable top-of-book level.
///
/// Returns the first `(price, cumulative_volume)` pair whose cumulative
/// volume exceeds `threshold`; if no prefix ever crosses it, returns the
/// best level unchanged. Returns `None` for an empty list.
pub fn true_top_of_book(levels: &[PriceLevel], threshold: Decimal) -> Option<PriceLevel> {
    let first = levels.first()?;

    let mut cumulative = Decimal::ZERO;
    for level in levels {
        cumulative += level.volume;
        if cumulative > threshold {
            return Some(PriceLevel::new(level.price, cumulative));
        }
    }

    Some(*first)
}
