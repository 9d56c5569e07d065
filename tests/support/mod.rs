#![allow(dead_code)]

pub mod scenario;

use rust_decimal::Decimal;
use settlebook::domain::{Amount, MarketId, Outcome, PositionId};
use settlebook::testkit::fixtures::{alice, bob, price, units};
use settlebook::testkit::Harness;

/// Positions from [`eth_threshold_market`].
pub struct TwoSided {
    pub market: MarketId,
    pub alice: PositionId,
    pub bob: PositionId,
}

/// ETH/USD above 3000: Alice stakes 1.0 at or below, Bob 2.0 above.
pub fn eth_threshold_market(h: &Harness) -> TwoSided {
    let market = h.market("eth-3000", price(Decimal::from(3000)));
    let alice = h
        .stake(&alice(), &market, Outcome::AtOrBelow, units(Decimal::ONE))
        .expect("alice stakes")
        .position_id;
    let bob = h
        .stake(&bob(), &market, Outcome::Above, units(Decimal::TWO))
        .expect("bob stakes")
        .position_id;
    TwoSided { market, alice, bob }
}

/// Sum of live net stakes on `market`.
pub fn live_stake(h: &Harness, market: &MarketId) -> Amount {
    h.engine
        .positions_on(market)
        .iter()
        .map(|p| p.net_stake())
        .sum()
}
