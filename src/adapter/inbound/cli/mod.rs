//! CLI module graph.

pub mod command;
pub mod config;
pub mod output;
pub mod quote;
pub mod replay;
pub mod scenario;

use command::{Cli, Commands, ConfigCommand};

use crate::error::Result;
use crate::infrastructure::config::logging::LoggingConfig;
use crate::infrastructure::config::settings::Config;

/// Log level implied by `-q`/`-v`, or `None` when neither is given.
#[must_use]
pub const fn flag_level(quiet: bool, verbose: u8) -> Option<&'static str> {
    match (quiet, verbose) {
        (true, _) => Some("error"),
        (false, 0) => None,
        (false, 1) => Some("info"),
        (false, 2) => Some("debug"),
        (false, _) => Some("trace"),
    }
}

/// Logging setup for this invocation.
///
/// Starts from `[logging]` of the config file the subcommand names, when
/// it loads. `-q`/`-v` replace the level and `--json` the format. Without
/// a usable file the CLI logs warnings in pretty format.
#[must_use]
pub fn logging_config(cli: &Cli) -> LoggingConfig {
    let mut logging = cli
        .config_path()
        .and_then(|path| Config::load(path).ok())
        .map_or_else(
            || LoggingConfig {
                level: "warn".into(),
                format: "pretty".into(),
            },
            |config| config.logging,
        );
    if let Some(level) = flag_level(cli.quiet, cli.verbose) {
        logging.level = level.into();
    }
    if cli.json {
        logging.format = "json".into();
    }
    logging
}

/// Run a parsed subcommand.
pub fn dispatch(command: &Commands) -> Result<()> {
    match command {
        Commands::Config(ConfigCommand::Init(args)) => config::execute_init(&args.path, args.force),
        Commands::Config(ConfigCommand::Show(args)) => config::execute_show(&args.config),
        Commands::Config(ConfigCommand::Validate(args)) => config::execute_validate(&args.config),
        Commands::Replay(args) => replay::execute(args),
        Commands::Quote(args) => quote::execute(args),
    }
}
