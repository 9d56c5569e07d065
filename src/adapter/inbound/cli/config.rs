//! Handler for the `config` command group.

use std::fs;
use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::domain::money::{format_bps, format_units};
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::protocol::{ORACLE_RESOLVER_ENV, OWNER_ENV};
use crate::infrastructure::config::settings::Config;

/// Default config template with documentation.
pub const CONFIG_TEMPLATE: &str = include_str!("../../../../config.toml.example");

/// Execute `config init`.
pub fn execute_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(ConfigError::InvalidValue {
            field: "config",
            reason: "file already exists (use --force to overwrite)".to_string(),
        }
        .into());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, CONFIG_TEMPLATE)?;
    output::section("Config Initialized");
    output::success("Created configuration file");
    output::field("Path", path.display());
    output::section("Next Steps");
    output::note(&format!("1. Edit {} with your identities", path.display()));
    output::note(&format!(
        "2. Optionally export {OWNER_ENV} or {ORACLE_RESOLVER_ENV}"
    ));
    output::note(&format!(
        "3. Run: settlebook config validate --config {}",
        path.display()
    ));
    Ok(())
}

/// Execute `config show`.
pub fn execute_show(path: &Path) -> Result<()> {
    let config = Config::load(path)?;
    let protocol = config.protocol_config()?;
    let decimals = config.protocol.decimals;

    if output::is_json() {
        output::json_output("config", serde_json::to_value(&config)?);
        return Ok(());
    }

    output::section("Protocol");
    output::field("Owner", &protocol.owner);
    output::field("Treasury", &protocol.treasury);
    output::field("Oracle resolver", &protocol.oracle_resolver);
    output::field("Reward distributor", &protocol.reward_distributor);
    output::field("Fee", format_bps(protocol.fee_bps));
    output::field(
        "Global min stake",
        format_units(protocol.global_min_stake, decimals),
    );
    output::field(
        "Market min stake",
        format_units(protocol.default_market_min_stake, decimals),
    );
    output::field(
        "Max staleness",
        format!("{}s", protocol.max_price_staleness_secs),
    );

    output::section("Keeper");
    output::field("Interval", format!("{}s", config.keeper.interval_secs));
    output::field("Max batch", config.keeper.max_batch);

    output::section("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", &config.logging.format);
    Ok(())
}

/// Execute `config validate`.
pub fn execute_validate(path: &Path) -> Result<()> {
    Config::load(path)?;
    output::success("Configuration is valid");
    output::field("Path", path.display());
    Ok(())
}
