//! Position records: one participant's stake on one market outcome.
//!
//! [`PositionBook`] is the id-to-entity registry. Minting inserts, transfer
//! rewrites the owner, and burning removes the entry and retires the id.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::SettlementError;
use super::id::{AccountId, MarketId, PositionId};
use super::market::Outcome;
use super::money::Amount;

/// A transferable claim on a market outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    id: PositionId,
    owner: AccountId,
    market_id: MarketId,
    outcome: Outcome,
    net_stake: Amount,
    created_at: DateTime<Utc>,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub fn new(
        id: PositionId,
        owner: AccountId,
        market_id: MarketId,
        outcome: Outcome,
        net_stake: Amount,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            market_id,
            outcome,
            net_stake,
            created_at,
        }
    }

    /// Get the position ID.
    #[must_use]
    pub const fn id(&self) -> PositionId {
        self.id
    }

    /// Get the current owner.
    #[must_use]
    pub const fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// Get the market ID.
    #[must_use]
    pub const fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    /// Get the predicted outcome.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Get the net stake (fee excluded).
    #[must_use]
    pub const fn net_stake(&self) -> Amount {
        self.net_stake
    }

    /// Get when the position was minted.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Registry of live positions.
///
/// The `(staker, market)` index is keyed on the identity that staked, not
/// on the current owner, and is kept after transfer and burn: one stake
/// per identity per market, ever. A position received by transfer does
/// not count as staking, so its new owner may still stake on the same
/// market and end up holding two positions there.
#[derive(Debug)]
pub struct PositionBook {
    positions: BTreeMap<PositionId, Position>,
    predictions: HashMap<(AccountId, MarketId), PositionId>,
    burned: HashSet<PositionId>,
    next_id: u64,
}

impl Default for PositionBook {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionBook {
    /// Create an empty book. Ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            positions: BTreeMap::new(),
            predictions: HashMap::new(),
            burned: HashSet::new(),
            next_id: 1,
        }
    }

    /// The id the next mint will receive.
    #[must_use]
    pub const fn peek_next_id(&self) -> PositionId {
        PositionId::new(self.next_id)
    }

    /// True if `user` already staked on `market_id`.
    #[must_use]
    pub fn has_predicted(&self, user: &AccountId, market_id: &MarketId) -> bool {
        self.predictions
            .contains_key(&(user.clone(), market_id.clone()))
    }

    /// Mint a position for `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::AlreadyPredicted`] if the pair already
    /// staked, or an overflow error when ids are exhausted.
    pub fn mint(
        &mut self,
        owner: AccountId,
        market_id: MarketId,
        outcome: Outcome,
        net_stake: Amount,
        created_at: DateTime<Utc>,
    ) -> Result<PositionId, SettlementError> {
        if self.has_predicted(&owner, &market_id) {
            return Err(SettlementError::AlreadyPredicted {
                user: owner,
                market_id,
            });
        }
        let id = self.peek_next_id();
        let next = self
            .next_id
            .checked_add(1)
            .ok_or(SettlementError::ArithmeticOverflow {
                operation: "position id",
            })?;

        self.insert(Position::new(
            id,
            owner.clone(),
            market_id.clone(),
            outcome,
            net_stake,
            created_at,
        ))?;
        self.next_id = next;
        self.predictions.insert((owner, market_id), id);
        Ok(id)
    }

    fn insert(&mut self, position: Position) -> Result<(), SettlementError> {
        let id = position.id();
        if self.burned.contains(&id) || self.positions.contains_key(&id) {
            return Err(SettlementError::PositionIdRetired { position_id: id });
        }
        self.positions.insert(id, position);
        Ok(())
    }

    /// Get a live position by ID.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::TokenDoesNotExist`] for unknown or burned ids.
    pub fn get(&self, id: PositionId) -> Result<&Position, SettlementError> {
        self.positions
            .get(&id)
            .ok_or(SettlementError::TokenDoesNotExist { position_id: id })
    }

    /// Rewrite the owner of a live position.
    ///
    /// # Errors
    ///
    /// Fails if the position does not exist, `from` is not the owner, or
    /// `to` is the zero identity.
    pub fn transfer(
        &mut self,
        id: PositionId,
        from: &AccountId,
        to: AccountId,
    ) -> Result<(), SettlementError> {
        if to.is_zero() {
            return Err(SettlementError::ZeroAddressInput { field: "recipient" });
        }
        let position = self
            .positions
            .get_mut(&id)
            .ok_or(SettlementError::TokenDoesNotExist { position_id: id })?;
        if position.owner() != from {
            return Err(SettlementError::NotPositionOwner {
                caller: from.clone(),
                position_id: id,
            });
        }
        position.owner = to;
        Ok(())
    }

    /// Remove a position and retire its id.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::TokenDoesNotExist`] for unknown or burned ids.
    pub fn burn(&mut self, id: PositionId) -> Result<Position, SettlementError> {
        let position = self
            .positions
            .remove(&id)
            .ok_or(SettlementError::TokenDoesNotExist { position_id: id })?;
        self.burned.insert(id);
        Ok(position)
    }

    /// True if the id belonged to a position that has been burned.
    #[must_use]
    pub fn is_burned(&self, id: PositionId) -> bool {
        self.burned.contains(&id)
    }

    /// Iterate over live positions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Iterate over live positions on one market.
    pub fn for_market<'a>(&'a self, market_id: &'a MarketId) -> impl Iterator<Item = &'a Position> {
        self.positions
            .values()
            .filter(move |p| p.market_id() == market_id)
    }

    /// Number of live positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True if no positions are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    fn bob() -> AccountId {
        AccountId::new("bob")
    }

    fn mint(book: &mut PositionBook, owner: AccountId, market: &str) -> PositionId {
        book.mint(owner, MarketId::new(market), Outcome::Above, 100, Utc::now())
            .unwrap()
    }

    #[test]
    fn ids_start_at_one_and_increment() {
        let mut book = PositionBook::new();
        assert_eq!(mint(&mut book, alice(), "m1").value(), 1);
        assert_eq!(mint(&mut book, alice(), "m2").value(), 2);
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn second_prediction_on_same_market_fails() {
        let mut book = PositionBook::new();
        mint(&mut book, alice(), "m1");
        let err = book
            .mint(alice(), MarketId::new("m1"), Outcome::AtOrBelow, 5, Utc::now())
            .unwrap_err();
        assert!(matches!(err, SettlementError::AlreadyPredicted { .. }));
        assert_eq!(book.peek_next_id().value(), 2);
    }

    #[test]
    fn burned_id_is_never_reissued() {
        let mut book = PositionBook::new();
        let id = mint(&mut book, alice(), "m1");
        book.burn(id).unwrap();
        book.next_id = id.value();

        let err = book
            .mint(bob(), MarketId::new("m1"), Outcome::Above, 5, Utc::now())
            .unwrap_err();
        assert_eq!(err, SettlementError::PositionIdRetired { position_id: id });
        assert_eq!(err.category(), crate::domain::ErrorCategory::StatePrecondition);
        assert!(!book.has_predicted(&bob(), &MarketId::new("m1")));
    }

    #[test]
    fn transferee_may_stake_alongside_received_position() {
        let mut book = PositionBook::new();
        let received = mint(&mut book, alice(), "m1");
        book.transfer(received, &alice(), bob()).unwrap();

        let own = mint(&mut book, bob(), "m1");
        assert_ne!(own, received);
        assert_eq!(book.get(received).unwrap().owner(), &bob());
        assert_eq!(book.get(own).unwrap().owner(), &bob());
    }

    #[test]
    fn transfer_rewrites_owner_but_not_staker_index() {
        let mut book = PositionBook::new();
        let id = mint(&mut book, alice(), "m1");
        book.transfer(id, &alice(), bob()).unwrap();

        assert_eq!(book.get(id).unwrap().owner(), &bob());
        assert!(book.has_predicted(&alice(), &MarketId::new("m1")));
        assert!(!book.has_predicted(&bob(), &MarketId::new("m1")));
    }

    #[test]
    fn transfer_requires_current_owner() {
        let mut book = PositionBook::new();
        let id = mint(&mut book, alice(), "m1");
        let err = book.transfer(id, &bob(), bob()).unwrap_err();
        assert!(matches!(err, SettlementError::NotPositionOwner { .. }));
    }

    #[test]
    fn transfer_rejects_zero_recipient() {
        let mut book = PositionBook::new();
        let id = mint(&mut book, alice(), "m1");
        let err = book.transfer(id, &alice(), AccountId::zero()).unwrap_err();
        assert!(matches!(err, SettlementError::ZeroAddressInput { .. }));
    }

    #[test]
    fn burn_retires_id() {
        let mut book = PositionBook::new();
        let id = mint(&mut book, alice(), "m1");
        book.burn(id).unwrap();

        assert!(book.is_burned(id));
        assert!(matches!(
            book.get(id),
            Err(SettlementError::TokenDoesNotExist { .. })
        ));
        assert!(matches!(
            book.burn(id),
            Err(SettlementError::TokenDoesNotExist { .. })
        ));
        assert!(book.has_predicted(&alice(), &MarketId::new("m1")));
    }

    #[test]
    fn for_market_filters() {
        let mut book = PositionBook::new();
        mint(&mut book, alice(), "m1");
        mint(&mut book, bob(), "m1");
        mint(&mut book, alice(), "m2");
        let market = MarketId::new("m1");
        assert_eq!(book.for_market(&market).count(), 2);
    }
}
