//! Automation port: the two-stage expiration and resolution contract.
//!
//! An external scheduler can only react to conditions it polls and to
//! records it observes. Stage 1 turns "time has passed" into a
//! `MarketExpired` record; stage 2 turns that record into a resolution
//! attempt. Both stages are idempotent and the hand-off between them is an
//! opaque payload the scheduler carries without interpreting.

use serde::{Deserialize, Serialize};

use crate::domain::{AccountId, MarketId, Resolution, SettlementError, SettlementRecord};

/// Stage 1 hand-off: markets found past expiration and unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationUpkeep {
    pub market_ids: Vec<MarketId>,
}

/// Stage 2 hand-off: a market to resolve from the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRequest {
    pub market_id: MarketId,
}

impl ResolutionRequest {
    /// Encode as the opaque bytes a scheduler stores between stages.
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        // A single string field always serializes.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode a payload produced by [`ResolutionRequest::to_payload`].
    ///
    /// # Errors
    ///
    /// Returns the JSON error for a malformed payload.
    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

/// Two-stage automation surface implemented by the settlement engine.
pub trait Automation: Send + Sync {
    /// Markets currently unresolved, the usual stage 1 candidate set.
    fn unresolved_markets(&self) -> Vec<MarketId>;

    /// Stage 1 check: which candidates are past expiration and unresolved.
    /// Read only; `None` when nothing needs doing.
    fn check_expirations(&self, candidates: &[MarketId]) -> Option<ExpirationUpkeep>;

    /// Stage 1 perform: emit `MarketExpired` for each still-eligible market
    /// not already announced. Returns the markets announced by this call.
    fn perform_expiration(&self, upkeep: &ExpirationUpkeep) -> Vec<MarketId>;

    /// Requests for upkeep markets whose `MarketExpired` record was already
    /// emitted and which are still unresolved.
    ///
    /// Lets a scheduler that lost the record (dropped request, restart with
    /// an empty inbox) resume stage 2 without a second announcement.
    fn announced_requests(&self, upkeep: &ExpirationUpkeep) -> Vec<ResolutionRequest>;

    /// Stage 2 check: recognize a `MarketExpired` record.
    fn check_expired_record(&self, record: &SettlementRecord) -> Option<ResolutionRequest>;

    /// Stage 2 perform: resolve from the oracle as `caller`.
    ///
    /// # Errors
    ///
    /// Any resolution error, notably [`SettlementError::PriceOracleStale`],
    /// which leaves the market unresolved for a later retry.
    fn perform_resolution(
        &self,
        caller: &AccountId,
        request: &ResolutionRequest,
    ) -> Result<Resolution, SettlementError>;
}
