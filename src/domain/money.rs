//! Monetary types for stake, fee, payout, and price representation.
//!
//! All ledger arithmetic is integer arithmetic in base units. Decimal
//! conversion exists only at the edges (configuration, scenarios, display).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Amount of the value medium in base units.
pub type Amount = u128;

/// Fixed-point oracle price in the feed's decimals.
pub type Price = i128;

/// Fee rate in basis points.
pub type BasisPoints = u32;

/// One hundred percent, in basis points.
pub const BPS_DENOMINATOR: BasisPoints = 10_000;

/// Largest decimal count accepted for unit conversion.
pub const MAX_DECIMALS: u32 = 18;

fn scale_factor(decimals: u32) -> Option<Decimal> {
    if decimals > MAX_DECIMALS {
        return None;
    }
    Some(Decimal::from(10u64.checked_pow(decimals)?))
}

/// Convert a human-unit decimal (e.g. `1.5`) to base units.
///
/// Returns `None` for negative values, values with more precision than
/// `decimals`, or values that overflow.
#[must_use]
pub fn parse_units(value: Decimal, decimals: u32) -> Option<Amount> {
    if value.is_sign_negative() {
        return None;
    }
    let scaled = value.checked_mul(scale_factor(decimals)?)?;
    if !scaled.fract().is_zero() {
        return None;
    }
    scaled.to_u128()
}

/// Convert a human-unit decimal price to fixed-point.
#[must_use]
pub fn parse_price(value: Decimal, decimals: u32) -> Option<Price> {
    let scaled = value.checked_mul(scale_factor(decimals)?)?;
    if !scaled.fract().is_zero() {
        return None;
    }
    scaled.to_i128()
}

/// Render base units as a human-unit decimal string.
///
/// Falls back to the raw integer when the value does not fit a `Decimal`.
#[must_use]
pub fn format_units(amount: Amount, decimals: u32) -> String {
    i128::try_from(amount)
        .ok()
        .and_then(|raw| Decimal::try_from_i128_with_scale(raw, decimals).ok())
        .map_or_else(|| amount.to_string(), |d| d.normalize().to_string())
}

/// Render a fee rate as a percentage string (e.g. `100` -> `1%`).
#[must_use]
pub fn format_bps(bps: BasisPoints) -> String {
    format!("{}%", Decimal::new(i64::from(bps), 2).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_units_scales_by_decimals() {
        assert_eq!(parse_units(dec!(1.0), 18), Some(1_000_000_000_000_000_000));
        assert_eq!(parse_units(dec!(2.5), 6), Some(2_500_000));
        assert_eq!(parse_units(dec!(0), 6), Some(0));
    }

    #[test]
    fn parse_units_rejects_sub_unit_precision() {
        assert_eq!(parse_units(dec!(0.0000001), 6), None);
    }

    #[test]
    fn parse_units_rejects_negative() {
        assert_eq!(parse_units(dec!(-1), 6), None);
    }

    #[test]
    fn parse_price_keeps_sign() {
        assert_eq!(parse_price(dec!(3000), 8), Some(300_000_000_000));
        assert_eq!(parse_price(dec!(-1.5), 2), Some(-150));
    }

    #[test]
    fn format_units_normalizes() {
        assert_eq!(format_units(1_500_000, 6), "1.5");
        assert_eq!(format_units(3_000_000_000_000_000_000, 18), "3");
        assert_eq!(format_units(7, 0), "7");
    }

    #[test]
    fn format_bps_as_percent() {
        assert_eq!(format_bps(100), "1%");
        assert_eq!(format_bps(250), "2.5%");
        assert_eq!(format_bps(10_000), "100%");
    }
}
