use clap::Parser;
use settlebook::adapter::inbound::cli::command::Cli;
use settlebook::adapter::inbound::cli::output::{self, OutputConfig};
use settlebook::adapter::inbound::cli::{dispatch, logging_config};

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    output::configure(
        OutputConfig::new(cli.json, cli.quiet, cli.verbose),
        &cli.color,
    );
    logging_config(&cli).init();

    if let Err(e) = dispatch(&cli.command) {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
