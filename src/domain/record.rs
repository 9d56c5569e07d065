//! Observable settlement records.
//!
//! Every committed state transition produces one record. Records are the
//! engine's only outward interface besides return values: indexers and UIs
//! consume them, and the automation bridge's second stage is triggered by
//! [`SettlementRecord::MarketExpired`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{AccountId, FeedId, MarketId, PositionId};
use super::market::Outcome;
use super::money::{Amount, Price};

/// A committed state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettlementRecord {
    /// A market was registered.
    MarketCreated {
        market_id: MarketId,
        price_feed: FeedId,
        price_threshold: Price,
        expiration: DateTime<Utc>,
    },
    /// A stake was recorded and its position minted.
    StakeRecorded {
        market_id: MarketId,
        position_id: PositionId,
        user: AccountId,
        outcome: Outcome,
        net_stake: Amount,
        fee: Amount,
    },
    /// A market passed expiration without being resolved.
    MarketExpired {
        market_id: MarketId,
        expiration: DateTime<Utc>,
    },
    /// A market was resolved.
    MarketResolved {
        market_id: MarketId,
        outcome: Outcome,
        price: Price,
        total_pool: Amount,
    },
    /// A winning position was paid out and burned.
    RewardClaimed {
        claimant: AccountId,
        position_id: PositionId,
        payout: Amount,
    },
    /// Accrued fees were sent to the treasury.
    FeesWithdrawn { treasury: AccountId, amount: Amount },
    /// A position changed owner.
    PositionTransferred {
        position_id: PositionId,
        from: AccountId,
        to: AccountId,
    },
    /// A configuration value changed.
    ConfigUpdated { field: String, value: String },
}

impl SettlementRecord {
    /// Stable record name, matching the serialized `type` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MarketCreated { .. } => "market_created",
            Self::StakeRecorded { .. } => "stake_recorded",
            Self::MarketExpired { .. } => "market_expired",
            Self::MarketResolved { .. } => "market_resolved",
            Self::RewardClaimed { .. } => "reward_claimed",
            Self::FeesWithdrawn { .. } => "fees_withdrawn",
            Self::PositionTransferred { .. } => "position_transferred",
            Self::ConfigUpdated { .. } => "config_updated",
        }
    }

    /// The market this record concerns, if any.
    #[must_use]
    pub const fn market_id(&self) -> Option<&MarketId> {
        match self {
            Self::MarketCreated { market_id, .. }
            | Self::StakeRecorded { market_id, .. }
            | Self::MarketExpired { market_id, .. }
            | Self::MarketResolved { market_id, .. } => Some(market_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let record = SettlementRecord::RewardClaimed {
            claimant: AccountId::new("bob"),
            position_id: PositionId::new(2),
            payout: 300,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "reward_claimed");
        assert_eq!(json["claimant"], "bob");
        assert_eq!(json["position_id"], 2);
        assert_eq!(record.kind(), "reward_claimed");
    }

    #[test]
    fn expired_record_roundtrips_for_schedulers() {
        let record = SettlementRecord::MarketExpired {
            market_id: MarketId::new("m1"),
            expiration: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: SettlementRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.market_id(), Some(&MarketId::new("m1")));
    }
}
