//! Canonical fixtures.
//!
//! Amounts use 18 decimals and prices 8, matching a typical value medium
//! and USD price feed.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::domain::money::{parse_price, parse_units};
use crate::domain::{AccountId, Amount, FeedId, Price, ProtocolConfig};

/// Decimals of test amounts.
pub const DECIMALS: u32 = 18;

/// Decimals of test prices.
pub const PRICE_DECIMALS: u32 = 8;

pub fn owner() -> AccountId {
    AccountId::new("0x1000000000000000000000000000000000000001")
}

pub fn treasury() -> AccountId {
    AccountId::new("0x2000000000000000000000000000000000000002")
}

pub fn resolver() -> AccountId {
    AccountId::new("0x3000000000000000000000000000000000000003")
}

pub fn distributor() -> AccountId {
    AccountId::new("0x4000000000000000000000000000000000000004")
}

pub fn alice() -> AccountId {
    AccountId::new("0xa11ce")
}

pub fn bob() -> AccountId {
    AccountId::new("0xb0b")
}

pub fn carol() -> AccountId {
    AccountId::new("0xca201")
}

pub fn eth_usd() -> FeedId {
    FeedId::new("ETH/USD")
}

/// 2025-01-01T00:00:00Z.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .expect("valid fixture time")
}

/// Human units to base units.
pub fn units(value: Decimal) -> Amount {
    parse_units(value, DECIMALS).expect("representable amount")
}

/// Human price to fixed point.
pub fn price(value: Decimal) -> Price {
    parse_price(value, PRICE_DECIMALS).expect("representable price")
}

/// 1% fee, 0.001 minimum stake, one hour staleness window.
pub fn protocol_config() -> ProtocolConfig {
    ProtocolConfig {
        owner: owner(),
        treasury: treasury(),
        oracle_resolver: resolver(),
        reward_distributor: distributor(),
        fee_bps: 100,
        global_min_stake: units(Decimal::new(1, 3)),
        default_market_min_stake: units(Decimal::new(1, 3)),
        max_price_staleness_secs: 3_600,
    }
}
