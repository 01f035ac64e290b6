//! Utility functions.

use rust_decimal::{Decimal, RoundingStrategy};

/// Wait for a shutdown signal (ctrl-c or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Round a value down (toward zero) to `dp` decimal places.
pub fn round_down(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
}

/// Round a value up (away from zero) to `dp` decimal places.
pub fn round_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::AwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn round_up_0_decimal() {
        assert_eq!(round_up(dec!(4.13456), 0), dec!(5));
    }

    #[test]
    fn round_up_3_decimal() {
        assert_eq!(round_up(dec!(4.45612389012), 3), dec!(4.457));
    }

    #[test]
    fn round_up_5_decimal() {
        assert_eq!(round_up(dec!(4.563), 5), dec!(4.563));
    }

    #[test]
    fn round_up_6_decimal() {
        assert_eq!(round_up(dec!(4.563000001), 6), dec!(4.563001));
    }

    #[test]
    fn round_down_0_decimal() {
        assert_eq!(round_down(dec!(4.63456), 0), dec!(4));
    }

    #[test]
    fn round_down_3_decimal() {
        assert_eq!(round_down(dec!(4.45672389012), 3), dec!(4.456));
    }

    #[test]
    fn round_down_5_decimal() {
        assert_eq!(round_down(dec!(4.563), 5), dec!(4.563));
    }

    #[test]
    fn round_down_6_decimal() {
        assert_eq!(round_down(dec!(4.563000009), 6), dec!(4.563));
    }
}
