//! Handler for `quote`: fee and payout for a hypothetical stake.

use rust_decimal::Decimal;
use serde_json::json;

use super::command::QuoteArgs;
use super::output;
use crate::domain::money::{format_bps, format_units, parse_units};
use crate::domain::payout::compute_payout;
use crate::domain::policy::{compute_fee, required_value, validate_fee_bps};
use crate::domain::Amount;
use crate::error::{ConfigError, Result};

/// A computed quote, in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub fee: Amount,
    pub required_value: Amount,
    pub payout: Amount,
}

fn units(field: &'static str, value: Decimal, decimals: u32) -> Result<Amount> {
    parse_units(value, decimals).ok_or_else(|| {
        ConfigError::InvalidValue {
            field,
            reason: format!("{value} is not a valid amount with {decimals} decimals"),
        }
        .into()
    })
}

/// Compute the quote for `args`.
///
/// # Errors
///
/// Returns an error for unrepresentable amounts, a fee above 100%, or a
/// stake larger than the winning pool.
pub fn compute(args: &QuoteArgs) -> Result<Quote> {
    validate_fee_bps(args.fee_bps)?;
    let stake = units("stake", args.stake, args.decimals)?;
    let winning_total = units("winning_total", args.winning_total, args.decimals)?;
    let losing_total = units("losing_total", args.losing_total, args.decimals)?;
    if stake > winning_total {
        return Err(ConfigError::InvalidValue {
            field: "winning_total",
            reason: "must include the quoted stake".to_string(),
        }
        .into());
    }

    Ok(Quote {
        fee: compute_fee(stake, args.fee_bps)?,
        required_value: required_value(stake, args.fee_bps)?,
        payout: compute_payout(stake, winning_total, losing_total)?,
    })
}

/// Execute `quote`.
pub fn execute(args: &QuoteArgs) -> Result<()> {
    let quote = compute(args)?;
    let fmt = |amount: Amount| format_units(amount, args.decimals);

    if output::is_json() {
        output::json_output(
            "quote",
            json!({
                "fee": fmt(quote.fee),
                "required_value": fmt(quote.required_value),
                "payout": fmt(quote.payout),
                "fee_bps": args.fee_bps,
            }),
        );
        return Ok(());
    }

    output::section("Quote");
    output::field("Fee rate", format_bps(args.fee_bps));
    output::field("Fee", fmt(quote.fee));
    output::field("Required value", fmt(quote.required_value));
    output::field("Payout if won", output::highlight(fmt(quote.payout)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn args(stake: Decimal, winning: Decimal, losing: Decimal) -> QuoteArgs {
        QuoteArgs {
            stake,
            winning_total: winning,
            losing_total: losing,
            fee_bps: 100,
            decimals: 18,
        }
    }

    #[test]
    fn sole_winner_takes_losing_pool() {
        let quote = compute(&args(dec!(2.0), dec!(2.0), dec!(1.0))).unwrap();
        assert_eq!(quote.payout, parse_units(dec!(3.0), 18).unwrap());
        assert_eq!(quote.fee, parse_units(dec!(0.02), 18).unwrap());
        assert_eq!(quote.required_value, parse_units(dec!(2.02), 18).unwrap());
    }

    #[test]
    fn no_opposition_returns_stake() {
        let quote = compute(&args(dec!(1.5), dec!(4.0), dec!(0))).unwrap();
        assert_eq!(quote.payout, parse_units(dec!(1.5), 18).unwrap());
    }

    #[test]
    fn stake_larger_than_pool_is_rejected() {
        assert!(compute(&args(dec!(5), dec!(2), dec!(1))).is_err());
    }

    #[test]
    fn fee_above_one_hundred_percent_is_rejected() {
        let mut a = args(dec!(1), dec!(1), dec!(1));
        a.fee_bps = 20_000;
        assert!(compute(&a).is_err());
    }
}
