//! Fee and minimum-stake policy.
//!
//! Pure calculations with no side effects. The protocol fee is charged on
//! top of the declared stake: a participant declaring `stake` must supply
//! `stake + fee`, and the full declared stake enters the pool.

use super::error::SettlementError;
use super::market::Market;
use super::money::{Amount, BasisPoints, BPS_DENOMINATOR};

/// Fee owed on a declared stake: `floor(stake * bps / 10_000)`.
///
/// # Errors
///
/// Returns [`SettlementError::ArithmeticOverflow`] if the product overflows.
pub fn compute_fee(declared_stake: Amount, fee_bps: BasisPoints) -> Result<Amount, SettlementError> {
    declared_stake
        .checked_mul(Amount::from(fee_bps))
        .map(|scaled| scaled / Amount::from(BPS_DENOMINATOR))
        .ok_or(SettlementError::ArithmeticOverflow { operation: "fee" })
}

/// Exact value a participant must supply for a declared stake.
///
/// # Errors
///
/// Returns [`SettlementError::ArithmeticOverflow`] if the sum overflows.
pub fn required_value(
    declared_stake: Amount,
    fee_bps: BasisPoints,
) -> Result<Amount, SettlementError> {
    let fee = compute_fee(declared_stake, fee_bps)?;
    declared_stake
        .checked_add(fee)
        .ok_or(SettlementError::ArithmeticOverflow {
            operation: "stake plus fee",
        })
}

/// Minimum stake that applies to `market`.
#[must_use]
pub fn minimum_for(market: &Market, default_market_min_stake: Amount) -> Amount {
    market.min_stake().unwrap_or(default_market_min_stake)
}

/// Check a default or per-market minimum against the global floor.
///
/// # Errors
///
/// Returns [`SettlementError::InvalidMinStake`] when `provided < global_minimum`.
pub fn validate_min_stake(provided: Amount, global_minimum: Amount) -> Result<(), SettlementError> {
    if provided < global_minimum {
        return Err(SettlementError::InvalidMinStake {
            provided,
            global_minimum,
        });
    }
    Ok(())
}

/// Check a fee rate is within 0..=10_000 bps.
///
/// # Errors
///
/// Returns [`SettlementError::InvalidFeeRate`] above 100%.
pub fn validate_fee_bps(bps: BasisPoints) -> Result<(), SettlementError> {
    if bps > BPS_DENOMINATOR {
        return Err(SettlementError::InvalidFeeRate {
            bps,
            max: BPS_DENOMINATOR,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::{FeedId, MarketId};
    use chrono::Utc;

    #[test]
    fn fee_is_floored() {
        assert_eq!(compute_fee(1_000, 100).unwrap(), 10);
        assert_eq!(compute_fee(99, 100).unwrap(), 0);
        assert_eq!(compute_fee(199, 100).unwrap(), 1);
        assert_eq!(compute_fee(12_345, 250).unwrap(), 308);
    }

    #[test]
    fn zero_rate_charges_nothing() {
        assert_eq!(compute_fee(1_000_000, 0).unwrap(), 0);
    }

    #[test]
    fn full_rate_doubles_required_value() {
        assert_eq!(required_value(500, 10_000).unwrap(), 1_000);
    }

    #[test]
    fn fee_overflow_is_reported() {
        let err = compute_fee(Amount::MAX, 2).unwrap_err();
        assert!(matches!(err, SettlementError::ArithmeticOverflow { .. }));
    }

    #[test]
    fn required_value_adds_fee_on_top() {
        let one = 1_000_000_000_000_000_000u128;
        assert_eq!(required_value(one, 100).unwrap(), one + one / 100);
    }

    #[test]
    fn minimum_prefers_market_override() {
        let expiration = Utc::now();
        let fixed = Market::new(MarketId::new("m"), expiration, FeedId::new("f"), 0, Some(50));
        let unset = Market::new(MarketId::new("n"), expiration, FeedId::new("f"), 0, None);
        assert_eq!(minimum_for(&fixed, 10), 50);
        assert_eq!(minimum_for(&unset, 10), 10);
    }

    #[test]
    fn min_stake_below_global_is_rejected() {
        assert!(validate_min_stake(10, 10).is_ok());
        assert_eq!(
            validate_min_stake(9, 10),
            Err(SettlementError::InvalidMinStake {
                provided: 9,
                global_minimum: 10
            })
        );
    }

    #[test]
    fn fee_rate_bounds() {
        assert!(validate_fee_bps(0).is_ok());
        assert!(validate_fee_bps(10_000).is_ok());
        assert!(validate_fee_bps(10_001).is_err());
    }
}
