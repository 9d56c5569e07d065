//! Market-related domain types.
//!
//! - [`Outcome`] - The two sides of a price-threshold market
//! - [`Market`] - A single pari-mutuel pool tied to one threshold and expiration
//! - [`MarketRegistry`] - Index of markets by market ID

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::SettlementError;
use super::id::{FeedId, MarketId};
use super::money::{Amount, Price};

/// Outcome of a price-threshold market.
///
/// A price exactly equal to the threshold resolves to [`Outcome::AtOrBelow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Observed price strictly above the threshold.
    Above,
    /// Observed price at or below the threshold.
    AtOrBelow,
}

impl Outcome {
    /// Derive the winning outcome from an observed price.
    #[must_use]
    pub fn from_observation(price: Price, threshold: Price) -> Self {
        if price > threshold {
            Self::Above
        } else {
            Self::AtOrBelow
        }
    }

    /// The other side of the market.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Above => Self::AtOrBelow,
            Self::AtOrBelow => Self::Above,
        }
    }

    /// Stable name used in logs and records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::AtOrBelow => "at_or_below",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Net stake accumulated on each side of a market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pools {
    above: Amount,
    at_or_below: Amount,
}

impl Pools {
    /// Net stake on one side.
    #[must_use]
    pub const fn total(&self, outcome: Outcome) -> Amount {
        match outcome {
            Outcome::Above => self.above,
            Outcome::AtOrBelow => self.at_or_below,
        }
    }

    /// Net stake on both sides combined.
    #[must_use]
    pub const fn combined(&self) -> Amount {
        // add_stake keeps the sum representable
        self.above.saturating_add(self.at_or_below)
    }

    fn add(&mut self, outcome: Outcome, amount: Amount) -> Result<(), SettlementError> {
        let overflow = SettlementError::ArithmeticOverflow {
            operation: "pool total",
        };
        self.combined()
            .checked_add(amount)
            .ok_or_else(|| overflow.clone())?;
        let slot = match outcome {
            Outcome::Above => &mut self.above,
            Outcome::AtOrBelow => &mut self.at_or_below,
        };
        *slot = slot.checked_add(amount).ok_or(overflow)?;
        Ok(())
    }
}

/// Settled result of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The winning side.
    pub outcome: Outcome,
    /// Price the decision was made on.
    pub observed_price: Price,
    /// When the market was resolved.
    pub resolved_at: DateTime<Utc>,
}

/// A binary pari-mutuel market on an external price.
///
/// Once resolved, the resolution and both pools are frozen: every mutator
/// checks [`Market::is_resolved`] first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    id: MarketId,
    expiration: DateTime<Utc>,
    price_feed: FeedId,
    price_threshold: Price,
    pools: Pools,
    min_stake: Option<Amount>,
    resolution: Option<Resolution>,
}

impl Market {
    /// Create an open market with empty pools.
    #[must_use]
    pub fn new(
        id: MarketId,
        expiration: DateTime<Utc>,
        price_feed: FeedId,
        price_threshold: Price,
        min_stake: Option<Amount>,
    ) -> Self {
        Self {
            id,
            expiration,
            price_feed,
            price_threshold,
            pools: Pools::default(),
            min_stake,
            resolution: None,
        }
    }

    /// Get the market ID.
    #[must_use]
    pub const fn id(&self) -> &MarketId {
        &self.id
    }

    /// Get the expiration timestamp.
    #[must_use]
    pub const fn expiration(&self) -> DateTime<Utc> {
        self.expiration
    }

    /// Get the price feed this market settles on.
    #[must_use]
    pub const fn price_feed(&self) -> &FeedId {
        &self.price_feed
    }

    /// Get the price threshold.
    #[must_use]
    pub const fn price_threshold(&self) -> Price {
        self.price_threshold
    }

    /// Get both pools.
    #[must_use]
    pub const fn pools(&self) -> &Pools {
        &self.pools
    }

    /// Get the per-market minimum stake, if one is fixed.
    #[must_use]
    pub const fn min_stake(&self) -> Option<Amount> {
        self.min_stake
    }

    /// Get the resolution, if the market is resolved.
    #[must_use]
    pub const fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// Get the winning outcome, if the market is resolved.
    #[must_use]
    pub fn winning_outcome(&self) -> Option<Outcome> {
        self.resolution.map(|r| r.outcome)
    }

    /// True once the market has been resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    /// True when `now` is at or past the expiration.
    #[must_use]
    pub fn is_past_expiration(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration
    }

    /// True when the market is past expiration and still awaiting resolution.
    #[must_use]
    pub fn awaits_resolution(&self, now: DateTime<Utc>) -> bool {
        self.is_past_expiration(now) && !self.is_resolved()
    }

    fn ensure_unresolved(&self) -> Result<(), SettlementError> {
        if self.is_resolved() {
            return Err(SettlementError::MarketAlreadyResolved {
                market_id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Add net stake to one side.
    ///
    /// # Errors
    ///
    /// Fails on a resolved market or when the pool would overflow.
    pub fn add_stake(&mut self, outcome: Outcome, amount: Amount) -> Result<(), SettlementError> {
        self.ensure_unresolved()?;
        self.pools.add(outcome, amount)
    }

    /// Replace the per-market minimum stake.
    ///
    /// # Errors
    ///
    /// Fails on a resolved market.
    pub fn set_min_stake(&mut self, amount: Amount) -> Result<(), SettlementError> {
        self.ensure_unresolved()?;
        self.min_stake = Some(amount);
        Ok(())
    }

    /// Resolve the market. Succeeds at most once.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::MarketAlreadyResolved`] on any second call.
    pub fn resolve(
        &mut self,
        outcome: Outcome,
        observed_price: Price,
        resolved_at: DateTime<Utc>,
    ) -> Result<Resolution, SettlementError> {
        self.ensure_unresolved()?;
        let resolution = Resolution {
            outcome,
            observed_price,
            resolved_at,
        };
        self.resolution = Some(resolution);
        Ok(resolution)
    }
}

/// Index of markets by market ID. Markets are never removed.
#[derive(Debug, Default, Clone)]
pub struct MarketRegistry {
    markets: BTreeMap<MarketId, Market>,
}

impl MarketRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a new market.
    ///
    /// # Errors
    ///
    /// - [`SettlementError::InvalidMarketId`] for the zero id
    /// - [`SettlementError::MarketAlreadyExists`] for a duplicate id
    /// - [`SettlementError::InvalidExpirationTime`] when `expiration <= now`
    pub fn create(
        &mut self,
        id: MarketId,
        expiration: DateTime<Utc>,
        price_feed: FeedId,
        price_threshold: Price,
        min_stake: Amount,
        now: DateTime<Utc>,
    ) -> Result<&Market, SettlementError> {
        if id.is_zero() {
            return Err(SettlementError::InvalidMarketId);
        }
        if self.markets.contains_key(&id) {
            return Err(SettlementError::MarketAlreadyExists { market_id: id });
        }
        if expiration <= now {
            return Err(SettlementError::InvalidExpirationTime { expiration, now });
        }

        let market = Market::new(
            id.clone(),
            expiration,
            price_feed,
            price_threshold,
            Some(min_stake),
        );
        Ok(self.markets.entry(id).or_insert(market))
    }

    /// Get a market by ID.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::MarketDoesNotExist`] for unknown ids.
    pub fn get(&self, id: &MarketId) -> Result<&Market, SettlementError> {
        self.markets
            .get(id)
            .ok_or_else(|| SettlementError::MarketDoesNotExist {
                market_id: id.clone(),
            })
    }

    /// Get a mutable market by ID.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::MarketDoesNotExist`] for unknown ids.
    pub fn get_mut(&mut self, id: &MarketId) -> Result<&mut Market, SettlementError> {
        self.markets
            .get_mut(id)
            .ok_or_else(|| SettlementError::MarketDoesNotExist {
                market_id: id.clone(),
            })
    }

    /// True if a market with this ID is registered.
    #[must_use]
    pub fn contains(&self, id: &MarketId) -> bool {
        self.markets.contains_key(id)
    }

    /// Iterate over all markets in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }

    /// Iterate over unresolved markets.
    pub fn unresolved(&self) -> impl Iterator<Item = &Market> {
        self.markets.values().filter(|m| !m.is_resolved())
    }

    /// Number of registered markets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markets.len()
    }

    /// True if no markets are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn registry_with(id: &str) -> MarketRegistry {
        let mut registry = MarketRegistry::new();
        registry
            .create(
                MarketId::new(id),
                now() + Duration::hours(1),
                FeedId::new("ETH/USD"),
                3000,
                10,
                now(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn outcome_tie_resolves_at_or_below() {
        assert_eq!(Outcome::from_observation(3000, 3000), Outcome::AtOrBelow);
        assert_eq!(Outcome::from_observation(3001, 3000), Outcome::Above);
        assert_eq!(Outcome::from_observation(2999, 3000), Outcome::AtOrBelow);
    }

    #[test]
    fn outcome_opposite() {
        assert_eq!(Outcome::Above.opposite(), Outcome::AtOrBelow);
        assert_eq!(Outcome::AtOrBelow.opposite(), Outcome::Above);
    }

    #[test]
    fn create_assigns_min_stake_and_empty_pools() {
        let registry = registry_with("m1");
        let market = registry.get(&MarketId::new("m1")).unwrap();
        assert_eq!(market.min_stake(), Some(10));
        assert_eq!(market.pools().combined(), 0);
        assert!(!market.is_resolved());
        assert_eq!(market.winning_outcome(), None);
    }

    #[test]
    fn create_rejects_zero_id() {
        let mut registry = MarketRegistry::new();
        let err = registry
            .create(
                MarketId::new("0x00"),
                now() + Duration::hours(1),
                FeedId::new("f"),
                1,
                1,
                now(),
            )
            .unwrap_err();
        assert_eq!(err, SettlementError::InvalidMarketId);
    }

    #[test]
    fn create_rejects_duplicate() {
        let mut registry = registry_with("m1");
        let err = registry
            .create(
                MarketId::new("m1"),
                now() + Duration::hours(2),
                FeedId::new("f"),
                1,
                1,
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, SettlementError::MarketAlreadyExists { .. }));
    }

    #[test]
    fn create_rejects_expiration_at_now() {
        let mut registry = MarketRegistry::new();
        let err = registry
            .create(MarketId::new("m1"), now(), FeedId::new("f"), 1, 1, now())
            .unwrap_err();
        assert!(matches!(err, SettlementError::InvalidExpirationTime { .. }));
    }

    #[test]
    fn past_expiration_is_inclusive() {
        let registry = registry_with("m1");
        let market = registry.get(&MarketId::new("m1")).unwrap();
        let expiration = market.expiration();
        assert!(!market.is_past_expiration(expiration - Duration::seconds(1)));
        assert!(market.is_past_expiration(expiration));
        assert!(market.awaits_resolution(expiration));
    }

    #[test]
    fn resolve_is_exactly_once_and_freezes_pools() {
        let mut registry = registry_with("m1");
        let market = registry.get_mut(&MarketId::new("m1")).unwrap();
        market.add_stake(Outcome::Above, 100).unwrap();

        market.resolve(Outcome::Above, 3100, now()).unwrap();
        let second = market.resolve(Outcome::AtOrBelow, 2900, now());
        assert!(matches!(
            second,
            Err(SettlementError::MarketAlreadyResolved { .. })
        ));
        assert_eq!(market.winning_outcome(), Some(Outcome::Above));

        assert!(market.add_stake(Outcome::Above, 1).is_err());
        assert_eq!(market.pools().total(Outcome::Above), 100);
    }

    #[test]
    fn add_stake_detects_overflow() {
        let mut registry = registry_with("m1");
        let market = registry.get_mut(&MarketId::new("m1")).unwrap();
        market.add_stake(Outcome::Above, Amount::MAX).unwrap();
        let err = market.add_stake(Outcome::AtOrBelow, 1).unwrap_err();
        assert!(matches!(err, SettlementError::ArithmeticOverflow { .. }));
        assert_eq!(market.pools().total(Outcome::AtOrBelow), 0);
    }

    #[test]
    fn get_unknown_market_fails() {
        let registry = MarketRegistry::new();
        assert!(matches!(
            registry.get(&MarketId::new("nope")),
            Err(SettlementError::MarketDoesNotExist { .. })
        ));
    }
}
