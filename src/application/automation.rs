//! Automation bridge: the engine side of the two-stage scheduler contract.

use tracing::{debug, info};

use super::engine::SettlementEngine;
use crate::domain::{AccountId, MarketId, Resolution, SettlementError, SettlementRecord};
use crate::port::{Automation, ExpirationUpkeep, ResolutionRequest};

impl Automation for SettlementEngine {
    fn unresolved_markets(&self) -> Vec<MarketId> {
        self.lock()
            .markets
            .unresolved()
            .map(|m| m.id().clone())
            .collect()
    }

    fn check_expirations(&self, candidates: &[MarketId]) -> Option<ExpirationUpkeep> {
        let now = self.now();
        let state = self.lock();
        let market_ids: Vec<MarketId> = candidates
            .iter()
            .filter(|id| {
                state
                    .markets
                    .get(id)
                    .is_ok_and(|market| market.awaits_resolution(now))
            })
            .cloned()
            .collect();

        debug!(
            candidates = candidates.len(),
            expired = market_ids.len(),
            "Checked expirations"
        );
        (!market_ids.is_empty()).then_some(ExpirationUpkeep { market_ids })
    }

    fn perform_expiration(&self, upkeep: &ExpirationUpkeep) -> Vec<MarketId> {
        let now = self.now();
        let records: Vec<SettlementRecord> = {
            let mut state = self.lock();
            let mut records = Vec::new();
            for market_id in &upkeep.market_ids {
                let Ok(market) = state.markets.get(market_id) else {
                    continue;
                };
                if !market.awaits_resolution(now) {
                    continue;
                }
                let expiration = market.expiration();
                if state.announced_expired.insert(market_id.clone()) {
                    records.push(SettlementRecord::MarketExpired {
                        market_id: market_id.clone(),
                        expiration,
                    });
                }
            }
            records
        };

        let announced: Vec<MarketId> = records
            .iter()
            .filter_map(|r| r.market_id().cloned())
            .collect();
        for market_id in &announced {
            info!(market_id = %market_id, "Market expired");
        }
        self.emit(records);
        announced
    }

    fn announced_requests(&self, upkeep: &ExpirationUpkeep) -> Vec<ResolutionRequest> {
        let state = self.lock();
        upkeep
            .market_ids
            .iter()
            .filter(|id| state.announced_expired.contains(*id))
            .filter(|id| state.markets.get(id).is_ok_and(|m| !m.is_resolved()))
            .map(|id| ResolutionRequest {
                market_id: id.clone(),
            })
            .collect()
    }

    fn check_expired_record(&self, record: &SettlementRecord) -> Option<ResolutionRequest> {
        let SettlementRecord::MarketExpired { market_id, .. } = record else {
            return None;
        };
        let unresolved = self
            .lock()
            .markets
            .get(market_id)
            .is_ok_and(|market| !market.is_resolved());
        unresolved.then(|| ResolutionRequest {
            market_id: market_id.clone(),
        })
    }

    fn perform_resolution(
        &self,
        caller: &AccountId,
        request: &ResolutionRequest,
    ) -> Result<Resolution, SettlementError> {
        self.resolve_from_oracle(caller, &request.market_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::fixtures::{alice, eth_usd, price, resolver};
    use crate::testkit::Harness;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn nothing_to_do_before_expiration() {
        let h = Harness::new();
        let market = h.market("eth", price(dec!(3000)));
        assert_eq!(h.engine.unresolved_markets(), vec![market.clone()]);
        assert!(h.engine.check_expirations(&[market]).is_none());
    }

    #[test]
    fn expiration_is_announced_once() {
        let h = Harness::new();
        let market = h.market("eth", price(dec!(3000)));
        let later = h.market_expiring("later", price(dec!(3000)), Duration::days(1));
        h.expire(&market);

        let candidates = h.engine.unresolved_markets();
        let upkeep = h.engine.check_expirations(&candidates).unwrap();
        assert_eq!(upkeep.market_ids, vec![market.clone()]);
        assert!(h.engine.announced_requests(&upkeep).is_empty());

        assert_eq!(h.engine.perform_expiration(&upkeep), vec![market.clone()]);
        assert!(h.engine.perform_expiration(&upkeep).is_empty());
        assert_eq!(h.engine.check_expirations(&candidates), Some(upkeep));
        assert_eq!(h.records.count("market_expired"), 1);
        assert!(!h.engine.market_details(&market).unwrap().is_resolved());
        assert!(!h.engine.is_past_expiration(&later).unwrap());
    }

    #[test]
    fn announced_market_can_be_requested_again() {
        let h = Harness::new();
        let market = h.market("eth", price(dec!(3000)));
        h.expire(&market);
        let upkeep = h.engine.check_expirations(&[market.clone()]).unwrap();
        h.engine.perform_expiration(&upkeep);

        let requests = h.engine.announced_requests(&upkeep);
        assert_eq!(requests, vec![ResolutionRequest { market_id: market.clone() }]);

        h.publish(&eth_usd(), price(dec!(3100)));
        h.engine.perform_resolution(&resolver(), &requests[0]).unwrap();
        assert!(h.engine.announced_requests(&upkeep).is_empty());
        assert!(h.engine.check_expirations(&[market]).is_none());
    }

    #[test]
    fn perform_revalidates_stale_upkeep() {
        let h = Harness::new();
        let market = h.market("eth", price(dec!(3000)));
        let upkeep = ExpirationUpkeep {
            market_ids: vec![market.clone(), MarketId::new("ghost")],
        };
        assert!(h.engine.perform_expiration(&upkeep).is_empty());
        assert_eq!(h.records.count("market_expired"), 0);
    }

    #[test]
    fn expired_record_becomes_resolution_request() {
        let h = Harness::new();
        let market = h.market("eth", price(dec!(3000)));
        h.expire(&market);
        let upkeep = h.engine.check_expirations(&[market.clone()]).unwrap();
        h.engine.perform_expiration(&upkeep);

        let record = h
            .records
            .records()
            .into_iter()
            .find(|r| r.kind() == "market_expired")
            .unwrap();
        let request = h.engine.check_expired_record(&record).unwrap();
        assert_eq!(request.market_id, market);

        let payload = request.to_payload();
        let request = ResolutionRequest::from_payload(&payload).unwrap();

        h.oracle
            .set_price(&eth_usd(), price(dec!(2999)), h.engine.now() - Duration::days(1));
        assert!(h.engine.perform_resolution(&resolver(), &request).is_err());
        assert!(h.engine.check_expired_record(&record).is_some());

        h.publish(&eth_usd(), price(dec!(2999)));
        let resolution = h.engine.perform_resolution(&resolver(), &request).unwrap();
        assert_eq!(resolution.outcome, crate::domain::Outcome::AtOrBelow);
        assert!(h.engine.check_expired_record(&record).is_none());
    }

    #[test]
    fn other_records_are_ignored() {
        let h = Harness::new();
        h.market("eth", price(dec!(3000)));
        let created = h.records.records().remove(0);
        assert!(h.engine.check_expired_record(&created).is_none());
        assert!(h
            .engine
            .perform_resolution(
                &alice(),
                &ResolutionRequest {
                    market_id: MarketId::new("eth")
                }
            )
            .is_err());
    }
}
