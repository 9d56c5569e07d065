//! Pari-mutuel payout arithmetic.
//!
//! A winning position gets its net stake back plus a share of the losing
//! pool proportional to its stake within the winning pool. Shares are
//! floored; the truncated remainder (dust) stays in escrow and is never
//! redistributed. Across `n` winners the dust is always below `n` units.

use super::error::SettlementError;
use super::money::Amount;

/// Payout for a winning position.
///
/// `net_stake` when nobody took the other side, otherwise
/// `net_stake + floor(net_stake * losing_total / winning_total)`.
///
/// # Errors
///
/// Returns [`SettlementError::ArithmeticOverflow`] if the intermediate
/// product overflows.
pub fn compute_payout(
    net_stake: Amount,
    winning_total: Amount,
    losing_total: Amount,
) -> Result<Amount, SettlementError> {
    if losing_total == 0 || winning_total == 0 {
        return Ok(net_stake);
    }
    let overflow = SettlementError::ArithmeticOverflow { operation: "payout" };
    let share = net_stake
        .checked_mul(losing_total)
        .ok_or_else(|| overflow.clone())?
        / winning_total;
    net_stake.checked_add(share).ok_or(overflow)
}

/// Result of splitting a losing pool across a set of winning stakes.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    /// Payout per winning stake, in input order.
    pub payouts: Vec<Amount>,
    /// Part of the losing pool left unclaimed by truncation.
    pub dust: Amount,
}

/// Split `losing_total` across `winning_stakes`.
///
/// The winning pool is the sum of `winning_stakes`.
///
/// # Errors
///
/// Returns [`SettlementError::ArithmeticOverflow`] on overflow.
#[cfg(test)]
pub fn distribute(
    winning_stakes: &[Amount],
    losing_total: Amount,
) -> Result<Distribution, SettlementError> {
    let overflow = SettlementError::ArithmeticOverflow {
        operation: "distribution",
    };
    let winning_total = winning_stakes
        .iter()
        .try_fold(0u128, |acc, stake| acc.checked_add(*stake))
        .ok_or_else(|| overflow.clone())?;

    let payouts = winning_stakes
        .iter()
        .map(|stake| compute_payout(*stake, winning_total, losing_total))
        .collect::<Result<Vec<_>, _>>()?;

    let paid_shares = payouts
        .iter()
        .zip(winning_stakes)
        .map(|(payout, stake)| payout - stake)
        .try_fold(0u128, |acc, share| acc.checked_add(share))
        .ok_or(overflow)?;

    let dust = if winning_total == 0 {
        losing_total
    } else {
        losing_total.saturating_sub(paid_shares)
    };

    Ok(Distribution { payouts, dust })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: Amount = 1_000_000_000_000_000_000;

    #[test]
    fn single_winner_takes_losing_pool() {
        // A stakes 1.0 below, B stakes 2.0 above, above wins
        assert_eq!(compute_payout(2 * ONE, 2 * ONE, ONE).unwrap(), 3 * ONE);
    }

    #[test]
    fn no_opposition_returns_principal() {
        assert_eq!(compute_payout(500, 500, 0).unwrap(), 500);
    }

    #[test]
    fn proportional_share_is_floored() {
        // 1 * 10 / 3 = 3.33 -> 3
        assert_eq!(compute_payout(1, 3, 10).unwrap(), 4);
    }

    #[test]
    fn dust_is_below_winner_count() {
        let stakes = [1, 1, 1];
        let dist = distribute(&stakes, 10).unwrap();
        assert_eq!(dist.payouts, vec![4, 4, 4]);
        assert_eq!(dist.dust, 1);
        assert!(dist.dust < stakes.len() as Amount);
    }

    #[test]
    fn exact_split_leaves_no_dust() {
        let dist = distribute(&[2, 3, 5], 100).unwrap();
        assert_eq!(dist.payouts, vec![22, 33, 55]);
        assert_eq!(dist.dust, 0);
    }

    #[test]
    fn conservation_holds_for_uneven_stakes() {
        let stakes = [7, 13, 29, 101, 3];
        let losing = 997;
        let dist = distribute(&stakes, losing).unwrap();
        let paid: Amount = dist.payouts.iter().sum();
        let principal: Amount = stakes.iter().sum();
        assert!(paid <= principal + losing);
        assert_eq!(paid + dist.dust, principal + losing);
        assert!(dist.dust < stakes.len() as Amount);
    }

    #[test]
    fn payout_overflow_is_reported() {
        let err = compute_payout(Amount::MAX, Amount::MAX, 2).unwrap_err();
        assert!(matches!(err, SettlementError::ArithmeticOverflow { .. }));
    }
}
