//! Handler for `replay`: run a scenario against in-memory adapters.

use std::fs::OpenOptions;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::command::ReplayArgs;
use super::output;
use super::scenario::{Scenario, Step};
use crate::adapter::inbound::keeper::{self, Keeper, KeeperSettings};
use crate::adapter::outbound::clock::ManualClock;
use crate::adapter::outbound::memory::{MemoryLedger, MemoryOracle};
use crate::adapter::outbound::record::{JsonLinesSink, LogRecordSink, RecordingSink};
use crate::application::{RewardDistributor, SettlementEngine};
use crate::domain::money::{format_units, parse_price};
use crate::domain::policy::required_value;
use crate::domain::{
    AccountId, Amount, FeedId, MarketId, PositionId, Price, ProtocolConfig, SettlementRecord,
};
use crate::error::{ConfigError, Error, Result, ScenarioError};
use crate::infrastructure::config::protocol::ProtocolSettings;
use crate::infrastructure::config::settings::Config;
use crate::port::{RecordSink, RecordSinkRegistry};

/// Totals after a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps: usize,
    pub failures: usize,
}

/// An engine wired to in-memory adapters, driven step by step.
pub struct Replay {
    engine: Arc<SettlementEngine>,
    distributor: RewardDistributor,
    keeper: Keeper,
    clock: Arc<ManualClock>,
    oracle: Arc<MemoryOracle>,
    ledger: Arc<MemoryLedger>,
    recorder: Arc<RecordingSink>,
    protocol: ProtocolConfig,
    settings: ProtocolSettings,
    price_decimals: u32,
}

impl Replay {
    /// Wire a fresh engine for `scenario`.
    ///
    /// Records go to the replay buffer, the keeper, the log, and `extra`
    /// when given. Keeper passes only run on `keeper_tick` steps, so only
    /// the batch size of `keeper_settings` matters.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `settings` do not validate.
    pub fn new(
        scenario: &Scenario,
        settings: ProtocolSettings,
        keeper_settings: KeeperSettings,
        extra: Option<Box<dyn RecordSink>>,
    ) -> Result<Self> {
        let protocol = settings.to_protocol_config()?;
        let clock = Arc::new(ManualClock::new(scenario.start));
        let oracle = Arc::new(MemoryOracle::new());
        let ledger = Arc::new(MemoryLedger::new());
        let recorder = Arc::new(RecordingSink::new());
        let (feed, inbox) = keeper::channel();

        let mut sinks = RecordSinkRegistry::new();
        sinks.register(Box::new(Arc::clone(&recorder)));
        sinks.register(Box::new(feed));
        sinks.register(Box::new(LogRecordSink));
        if let Some(extra) = extra {
            sinks.register(extra);
        }

        let engine = Arc::new(
            SettlementEngine::builder(protocol.clone(), oracle.clone(), ledger.clone())
                .clock(clock.clone())
                .record_sink(Arc::new(sinks))
                .build()?,
        );
        let distributor =
            RewardDistributor::new(Arc::clone(&engine), protocol.reward_distributor.clone());
        let keeper = Keeper::new(
            engine.clone(),
            protocol.oracle_resolver.clone(),
            inbox,
            keeper_settings,
        );

        Ok(Self {
            engine,
            distributor,
            keeper,
            clock,
            oracle,
            ledger,
            recorder,
            protocol,
            settings,
            price_decimals: scenario.price_decimals,
        })
    }

    /// The engine under replay.
    #[must_use]
    pub fn engine(&self) -> &SettlementEngine {
        &self.engine
    }

    /// The in-memory value medium.
    #[must_use]
    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    /// Records emitted since the last call.
    pub fn take_records(&self) -> Vec<SettlementRecord> {
        self.recorder.drain()
    }

    fn amount(&self, field: &'static str, value: Decimal) -> Result<Amount> {
        self.settings.units(field, value)
    }

    fn price(&self, step: usize, value: Decimal) -> Result<Price> {
        parse_price(value, self.price_decimals).ok_or_else(|| {
            ScenarioError::InvalidStep {
                step,
                reason: format!("price {value} has more than {} decimals", self.price_decimals),
            }
            .into()
        })
    }

    fn show(&self, amount: Amount) -> String {
        format_units(amount, self.settings.decimals)
    }

    /// Apply one step and describe its effect.
    ///
    /// # Errors
    ///
    /// Returns the engine's error for rejected operations, or a scenario
    /// error for malformed step values.
    pub fn apply(&self, index: usize, step: &Step) -> Result<String> {
        let owner = &self.protocol.owner;
        let resolver = &self.protocol.oracle_resolver;
        let detail = match step {
            Step::CreateMarket {
                market,
                feed,
                threshold,
                expires_in_secs,
            } => {
                let threshold = self.price(index, *threshold)?;
                let expiration = Duration::try_seconds(*expires_in_secs)
                    .and_then(|delta| self.clock_now().checked_add_signed(delta))
                    .ok_or_else(|| out_of_range(index, *expires_in_secs))?;
                let market = self.engine.create_market(
                    owner,
                    MarketId::new(market.as_str()),
                    expiration,
                    FeedId::new(feed.as_str()),
                    threshold,
                )?;
                format!("{} expires {}", market.id(), market.expiration().to_rfc3339())
            }
            Step::Predict {
                user,
                market,
                outcome,
                stake,
                value,
            } => {
                let stake = self.amount("stake", *stake)?;
                let value = match value {
                    Some(value) => self.amount("value", *value)?,
                    None => required_value(stake, self.engine.config().fee_bps)?,
                };
                let receipt = self.engine.record_prediction(
                    &AccountId::new(user.as_str()),
                    &MarketId::new(market.as_str()),
                    *outcome,
                    stake,
                    value,
                )?;
                format!(
                    "{} {outcome} stake={} fee={}",
                    receipt.position_id,
                    self.show(receipt.net_stake),
                    self.show(receipt.fee)
                )
            }
            Step::SetPrice {
                feed,
                price,
                age_secs,
            } => {
                let raw = self.price(index, *price)?;
                let updated_at = Duration::try_seconds(*age_secs)
                    .and_then(|delta| self.clock_now().checked_sub_signed(delta))
                    .ok_or_else(|| out_of_range(index, *age_secs))?;
                self.oracle.set_price(&FeedId::new(feed.as_str()), raw, updated_at);
                format!("{feed} = {price} ({age_secs}s old)")
            }
            Step::OracleOutage { feed } => {
                self.oracle.fail(&FeedId::new(feed.as_str()));
                format!("{feed} down")
            }
            Step::OracleRestore { feed } => {
                self.oracle.restore(&FeedId::new(feed.as_str()));
                format!("{feed} restored")
            }
            Step::Advance { secs } => {
                let target = Duration::try_seconds(*secs)
                    .and_then(|delta| self.clock_now().checked_add_signed(delta))
                    .ok_or_else(|| out_of_range(index, *secs))?;
                self.clock.set(target);
                format!("now {}", self.clock_now().to_rfc3339())
            }
            Step::KeeperTick => {
                let report = self.keeper.tick();
                format!(
                    "announced={} resolved={} retrying={} dropped={}",
                    report.announced, report.resolved, report.retrying, report.dropped
                )
            }
            Step::Resolve { market } => {
                let resolution = self
                    .engine
                    .resolve_from_oracle(resolver, &MarketId::new(market.as_str()))?;
                format!("{market} {} at {}", resolution.outcome, resolution.observed_price)
            }
            Step::ResolveManual {
                market,
                outcome,
                price,
            } => {
                let price = self.price(index, *price)?;
                let resolution = self.engine.resolve_market(
                    resolver,
                    &MarketId::new(market.as_str()),
                    *outcome,
                    price,
                )?;
                format!("{market} {}", resolution.outcome)
            }
            Step::Claim { user, position } => {
                let receipt = self
                    .distributor
                    .claim(&AccountId::new(user.as_str()), PositionId::new(*position))?;
                format!(
                    "{} paid {} to {}",
                    receipt.position_id,
                    self.show(receipt.payout),
                    receipt.claimant
                )
            }
            Step::RejectTransfers { account } => {
                self.ledger.reject(&AccountId::new(account.as_str()));
                format!("{account} rejects transfers")
            }
            Step::AcceptTransfers { account } => {
                self.ledger.accept(&AccountId::new(account.as_str()));
                format!("{account} accepts transfers")
            }
            Step::TransferPosition { from, position, to } => {
                self.engine.transfer_position(
                    &AccountId::new(from.as_str()),
                    PositionId::new(*position),
                    AccountId::new(to.as_str()),
                )?;
                format!("pos-{position} {from} -> {to}")
            }
            Step::WithdrawFees { amount } => {
                let amount = self.amount("amount", *amount)?;
                self.engine.withdraw_fees(owner, amount)?;
                format!("{} to {}", self.show(amount), self.protocol.treasury)
            }
            Step::SetFeeBps { bps } => {
                self.engine.set_fee_bps(owner, *bps)?;
                format!("fee_bps = {bps}")
            }
        };
        debug!(step = index, action = step.action(), "Replay step applied");
        Ok(detail)
    }

    fn clock_now(&self) -> DateTime<Utc> {
        self.engine.now()
    }

    /// Run every step, printing results and records as they happen.
    ///
    /// # Errors
    ///
    /// With `strict`, returns [`ScenarioError::StepFailed`] (or the step's
    /// own error) at the first failure.
    pub fn run(&self, scenario: &Scenario, strict: bool) -> Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();
        for (offset, step) in scenario.steps.iter().enumerate() {
            let index = offset + 1;
            summary.steps += 1;
            let result = self.apply(index, step);
            output::step(
                index,
                step.action(),
                result.as_ref().cloned().map_err(ToString::to_string),
            );
            let timestamp = self.clock_now().to_rfc3339();
            for record in self.take_records() {
                output::record(&timestamp, &record);
            }

            if let Err(e) = result {
                summary.failures += 1;
                if strict {
                    return Err(match e {
                        Error::Settlement(source) => ScenarioError::StepFailed {
                            step: index,
                            source,
                        }
                        .into(),
                        other => other,
                    });
                }
            }
        }
        info!(
            steps = summary.steps,
            failures = summary.failures,
            "Replay finished"
        );
        Ok(summary)
    }

    /// Print balances and positions.
    pub fn print_summary(&self, summary: ReplaySummary) {
        output::section("Summary");
        output::field("Steps", summary.steps);
        output::field("Failures", summary.failures);
        output::field("Markets", self.engine.markets().len());
        output::field("Fees", self.show(self.engine.fee_balance()));
        output::field("Escrow", self.show(self.engine.escrow_balance()));
        output::field("Paid out", self.show(self.ledger.total_paid()));

        let markets = self.engine.markets();
        let positions: Vec<_> = markets
            .iter()
            .flat_map(|m| self.engine.positions_on(m.id()))
            .collect();
        if positions.is_empty() {
            return;
        }

        output::section("Open positions");
        let widths = [8, 14, 14, 12, 20];
        output::table_header(&[
            ("id", widths[0]),
            ("owner", widths[1]),
            ("market", widths[2]),
            ("outcome", widths[3]),
            ("stake", widths[4]),
        ]);
        for position in positions {
            output::table_row(
                &[
                    position.id().to_string(),
                    position.owner().to_string(),
                    position.market_id().to_string(),
                    position.outcome().to_string(),
                    self.show(position.net_stake()),
                ],
                &widths,
            );
        }
    }
}

fn out_of_range(step: usize, secs: i64) -> Error {
    ScenarioError::InvalidStep {
        step,
        reason: format!("offset of {secs}s is outside the representable time range"),
    }
    .into()
}

fn replay_settings(
    args: &ReplayArgs,
    scenario: &Scenario,
) -> Result<(ProtocolSettings, KeeperSettings)> {
    if let Some(path) = &args.config {
        let config = Config::load(path)?;
        return Ok((config.protocol, config.keeper.settings()));
    }
    let mut settings = scenario
        .protocol
        .clone()
        .ok_or(ConfigError::MissingField { field: "protocol" })?;
    settings.apply_env();
    Ok((settings, KeeperSettings::default()))
}

/// Execute `replay`.
pub fn execute(args: &ReplayArgs) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    let (settings, keeper) = replay_settings(args, &scenario)?;

    let extra: Option<Box<dyn RecordSink>> = match &args.records {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(Box::new(JsonLinesSink::new(file)))
        }
        None => None,
    };

    let replay = Replay::new(&scenario, settings, keeper, extra)?;
    output::section(&format!("Replaying {}", args.scenario.display()));
    let summary = replay.run(&scenario, args.strict)?;
    replay.print_summary(summary);
    if summary.failures > 0 {
        output::warning(&format!("{} step(s) failed", summary.failures));
    } else {
        output::success("All steps succeeded");
    }
    Ok(())
}
