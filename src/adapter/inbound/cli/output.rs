//! CLI output formatting.
//!
//! Human-readable output uses colored symbols and aligned fields. In JSON
//! mode every line is an object `{"type": ..., "payload": ...}` so scripts
//! can consume replay output line by line.

use std::fmt::Display;
use std::sync::OnceLock;

use owo_colors::{OwoColorize, Stream};
use parking_lot::RwLock;
use serde_json::json;

use super::command::ColorChoice;
use crate::domain::SettlementRecord;

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
    /// Verbosity level (0 = normal, 1+ = increasingly verbose).
    pub verbose: u8,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            json,
            quiet,
            verbose,
        }
    }
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn read_config() -> OutputConfig {
    *config_cell().read()
}

fn regular_output_suppressed(config: OutputConfig) -> bool {
    !config.json && config.quiet
}

macro_rules! painter {
    ($($name:ident),* $(,)?) => {
        $(
            fn $name(text: impl Display) -> String {
                text.if_supports_color(Stream::Stdout, |t| t.$name()).to_string()
            }
        )*
    };
}

painter!(green, red, yellow, cyan, magenta, dimmed, bold);

fn emit_json_line(kind: &str, payload: serde_json::Value) {
    println!(
        "{}",
        json!({
            "type": kind,
            "payload": payload,
        })
    );
}

/// Apply output settings from global CLI flags.
///
/// Call this early in the CLI entry point, before anything is printed.
pub fn configure(config: OutputConfig, color: &ColorChoice) {
    *config_cell().write() = config;
    match color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto if config.json => owo_colors::set_override(false),
        ColorChoice::Auto => owo_colors::unset_override(),
    }
}

/// Return whether machine-readable JSON output is enabled.
#[must_use]
pub fn is_json() -> bool {
    read_config().json
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    let config = read_config();
    let value = value.to_string();

    if config.json {
        emit_json_line(
            "field",
            json!({
                "label": label,
                "value": value,
            }),
        );
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {:<20} {}", dimmed(label), value);
}

/// Print a success line.
pub fn success(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("success", json!({ "message": message }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {} {}", green("✓"), message);
}

/// Print a warning line.
pub fn warning(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("warning", json!({ "message": message }));
        return;
    }

    println!("  {} {}", yellow("⚠"), message);
}

/// Print an error line to stderr.
pub fn error(message: &str) {
    let config = read_config();

    if config.json {
        eprintln!(
            "{}",
            json!({
                "type": "error",
                "payload": { "message": message },
            })
        );
        return;
    }

    eprintln!("  {} {}", red("×"), message);
}

/// Print a section header.
pub fn section(title: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("section", json!({ "title": title }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!();
    println!("{}", bold(title));
}

/// Print a dimmed note.
pub fn note(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("note", json!({ "message": message }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {}", dimmed(message));
}

/// Print the outcome of one replay step.
pub fn step(index: usize, action: &str, result: Result<String, String>) {
    let config = read_config();

    if config.json {
        let payload = match &result {
            Ok(detail) => json!({ "step": index, "action": action, "ok": true, "detail": detail }),
            Err(reason) => json!({ "step": index, "action": action, "ok": false, "error": reason }),
        };
        emit_json_line("step", payload);
        return;
    }

    match result {
        Ok(detail) if !config.quiet => {
            println!("  {} {:>3} {:<18} {}", green("✓"), index, cyan(action), detail);
        }
        Ok(_) => {}
        Err(reason) => {
            println!("  {} {:>3} {:<18} {}", red("×"), index, cyan(action), red(reason));
        }
    }
}

/// Print an emitted settlement record.
pub fn record(timestamp: &str, record: &SettlementRecord) {
    let config = read_config();

    if config.json {
        let payload =
            serde_json::to_value(record).unwrap_or_else(|e| json!({ "error": e.to_string() }));
        emit_json_line(
            "record",
            json!({ "timestamp": timestamp, "record": payload }),
        );
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    let kind = record.kind();
    let label = match record {
        SettlementRecord::MarketResolved { .. } | SettlementRecord::RewardClaimed { .. } => {
            green(kind)
        }
        SettlementRecord::MarketExpired { .. } => yellow(kind),
        _ => magenta(kind),
    };
    println!("        {} {} {}", dimmed(timestamp), label, dimmed(describe(record)));
}

fn describe(record: &SettlementRecord) -> String {
    match record {
        SettlementRecord::MarketCreated {
            market_id,
            price_feed,
            price_threshold,
            ..
        } => format!("{market_id} {price_feed} > {price_threshold}"),
        SettlementRecord::StakeRecorded {
            market_id,
            position_id,
            user,
            outcome,
            net_stake,
            fee,
        } => format!("{position_id} {user} {outcome} on {market_id} stake={net_stake} fee={fee}"),
        SettlementRecord::MarketExpired { market_id, .. } => market_id.to_string(),
        SettlementRecord::MarketResolved {
            market_id,
            outcome,
            price,
            total_pool,
        } => format!("{market_id} {outcome} at {price} pool={total_pool}"),
        SettlementRecord::RewardClaimed {
            claimant,
            position_id,
            payout,
        } => format!("{position_id} to {claimant} payout={payout}"),
        SettlementRecord::FeesWithdrawn { treasury, amount } => {
            format!("{amount} to {treasury}")
        }
        SettlementRecord::PositionTransferred {
            position_id,
            from,
            to,
        } => format!("{position_id} {from} -> {to}"),
        SettlementRecord::ConfigUpdated { field, value } => format!("{field} = {value}"),
    }
}

/// Format a highlighted value in cyan.
pub fn highlight(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        return value;
    }
    cyan(value)
}

/// Emit a JSON value directly (for commands that need custom JSON output).
pub fn json_output(kind: &str, value: serde_json::Value) {
    emit_json_line(kind, value);
}

/// Print a table header row.
pub fn table_header(columns: &[(&str, usize)]) {
    let config = read_config();

    if config.json || regular_output_suppressed(config) {
        return;
    }

    let mut line = String::from("  ");
    for &(name, width) in columns {
        line.push_str(&format!("{name:<width$} "));
    }
    println!("{}", dimmed(line));
}

/// Print a table data row.
pub fn table_row(cells: &[String], widths: &[usize]) {
    let config = read_config();

    if config.json || regular_output_suppressed(config) {
        return;
    }

    let mut line = String::from("  ");
    for (cell, width) in cells.iter().zip(widths.iter().copied()) {
        line.push_str(&format!("{cell:<width$} "));
    }
    println!("{line}");
}
