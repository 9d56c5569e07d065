//! Command-line interface definitions.
//!
//! Defines the CLI structure for the settlebook binary using `clap`.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG: &str = "config.toml";

/// Pari-mutuel prediction market settlement toolkit
#[derive(Parser, Debug)]
#[command(name = "settlebook")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Replay a scripted scenario against in-memory adapters
    Replay(ReplayArgs),

    /// Compute the fee and payout for a stake
    Quote(QuoteArgs),
}

/// Subcommands for `settlebook config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Generate a new configuration file from template.
    Init(ConfigInitArgs),
    /// Display the effective configuration with defaults applied.
    Show(ConfigPathArg),
    /// Validate a configuration file for correctness.
    Validate(ConfigPathArg),
}

/// Shared `--config` argument.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

/// Arguments for `config init`.
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Output path for the generated configuration file.
    #[arg(default_value = DEFAULT_CONFIG)]
    pub path: PathBuf,
    /// Overwrite the file if it already exists.
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Existing config file named by the subcommand, if any.
    #[must_use]
    pub fn config_path(&self) -> Option<&Path> {
        match &self.command {
            Commands::Config(ConfigCommand::Show(args) | ConfigCommand::Validate(args)) => {
                Some(&args.config)
            }
            Commands::Replay(args) => args.config.as_deref(),
            Commands::Config(ConfigCommand::Init(_)) | Commands::Quote(_) => None,
        }
    }
}

/// Arguments for `replay`.
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Scenario file (TOML).
    pub scenario: PathBuf,

    /// Configuration file; overrides the scenario's `[protocol]` section.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Stop at the first failing step.
    #[arg(long)]
    pub strict: bool,

    /// Also append every record as a JSON line to this file.
    #[arg(long)]
    pub records: Option<PathBuf>,
}

/// Arguments for `quote`.
///
/// Pool totals are final totals, including the quoted stake on the
/// winning side.
#[derive(Parser, Debug)]
pub struct QuoteArgs {
    /// Net stake, in human units.
    #[arg(long)]
    pub stake: Decimal,

    /// Final total of the winning pool.
    #[arg(long)]
    pub winning_total: Decimal,

    /// Final total of the losing pool.
    #[arg(long)]
    pub losing_total: Decimal,

    /// Protocol fee in basis points.
    #[arg(long, default_value_t = 100)]
    pub fee_bps: u32,

    /// Decimals of the value medium.
    #[arg(long, default_value_t = 18)]
    pub decimals: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_quote() {
        let cli = Cli::parse_from([
            "settlebook",
            "quote",
            "--stake",
            "2.0",
            "--winning-total",
            "2.0",
            "--losing-total",
            "1.0",
        ]);
        let Commands::Quote(args) = cli.command else {
            panic!("expected quote");
        };
        assert_eq!(args.fee_bps, 100);
        assert_eq!(args.stake, Decimal::TWO);
    }

    #[test]
    fn parses_replay_with_global_flags() {
        let cli = Cli::parse_from(["settlebook", "--json", "replay", "s.toml", "--strict"]);
        assert!(cli.json);
        let Commands::Replay(args) = cli.command else {
            panic!("expected replay");
        };
        assert!(args.strict);
        assert!(args.config.is_none());
    }
}
