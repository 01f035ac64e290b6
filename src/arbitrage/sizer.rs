//! Position sizing under balance and liquidity constraints.

use rust_decimal::Decimal;

use crate::balance::Balance;
use crate::config::Config;
use crate::orderbook::PriceLevel;
use crate::utils::round_down;

/// Fixed sizing limits taken from configuration.
#[derive(Debug, Clone)]
pub struct SizingLimits {
    /// Smallest tradable volume.
    pub min_trade_volume: Decimal,
    /// Volume left resting in the counter level.
    pub listing_buffer: Decimal,
    /// Quote-currency reserve, never spent.
    pub quote_reserve: Decimal,
    /// Base-asset reserve, never sold.
    pub base_reserve: Decimal,
}

impl SizingLimits {
    /// Derive limits from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_trade_volume: config.min_trade_volume,
            listing_buffer: config.listing_buffer,
            quote_reserve: config.quote_reserve,
            base_reserve: config.base_reserve,
        }
    }
}

/// Outcome of sizing a candidate trade.
///
/// Only `Sized` leads to orders; the other variants are normal, frequent
/// decision outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizingOutcome {
    /// Trade is viable at these volumes.
    Sized {
        /// Volume to buy on the cheap venue.
        purchase_volume: Decimal,
        /// Volume to sell on the expensive venue.
        sell_volume: Decimal,
    },
    /// Not enough executable volume on one side of the pair.
    InsufficientLiquidity {
        /// The limiting side's volume.
        available: Decimal,
    },
    /// Nothing to spend on the buyer venue after the quote reserve.
    InsufficientBuyerFunds,
    /// Nothing to sell on the seller venue after the base reserve.
    InsufficientSellerFunds,
    /// Viable purchase, but the post-fee sell volume is below the minimum
    /// tradable size.
    BelowMinimum {
        /// The sell volume that fell short.
        sell_volume: Decimal,
    },
}

/// Size a buy-on-`buyer`/sell-on-`seller` pair.
///
/// The listing buffer guards against depleting a price level other
/// participants may be quoting against; reserves are safety margins that
/// are never spent. The sell volume additionally pays the buyer venue's
/// withdrawal fee plus a one-unit safety margin.
pub fn size_trade(
    buyer_ask: &PriceLevel,
    seller_bid: &PriceLevel,
    buyer_balance: &Balance,
    seller_balance: &Balance,
    buyer_withdrawal_fee: Decimal,
    buyer_volume_precision: u32,
    limits: &SizingLimits,
) -> SizingOutcome {
    let available = buyer_ask.volume.min(seller_bid.volume);
    if available < limits.min_trade_volume + limits.listing_buffer {
        return SizingOutcome::InsufficientLiquidity { available };
    }

    if buyer_ask.price <= Decimal::ZERO {
        return SizingOutcome::InsufficientLiquidity { available: Decimal::ZERO };
    }

    let usable_quote = buyer_balance.quote - limits.quote_reserve;
    if usable_quote <= Decimal::ZERO {
        return SizingOutcome::InsufficientBuyerFunds;
    }

    let usable_base = seller_balance.base - limits.base_reserve;
    if usable_base <= Decimal::ZERO {
        return SizingOutcome::InsufficientSellerFunds;
    }

    let affordable = round_down(usable_quote / buyer_ask.price, buyer_volume_precision);
    let purchase_volume = affordable
        .min(usable_base)
        .min(available - limits.listing_buffer);

    let sell_volume = purchase_volume * (Decimal::ONE - buyer_withdrawal_fee) - Decimal::ONE;
    if sell_volume < limits.min_trade_volume {
        return SizingOutcome::BelowMinimum { sell_volume };
    }

    SizingOutcome::Sized {
        purchase_volume,
        sell_volume,
    }
}
