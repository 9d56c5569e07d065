//! Configuration loading from disk.

mod support;

use settlebook::error::{ConfigError, Error};
use settlebook::infrastructure::config::settings::Config;
use support::scenario::{write_temp, PROTOCOL};

#[test]
fn shipped_example_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml.example");
    let config = Config::load(&path).unwrap();
    let protocol = config.protocol_config().unwrap();

    assert_eq!(protocol.fee_bps, 100);
    assert_eq!(protocol.global_min_stake, 1_000_000_000_000_000);
    assert_eq!(protocol.max_price_staleness_secs, 3_600);
    assert_eq!(config.keeper.max_batch, 50);
}

#[test]
fn defaults_fill_missing_sections() {
    let (_dir, path) = write_temp("config.toml", PROTOCOL);
    let config = Config::load(&path).unwrap();

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, "pretty");
    assert_eq!(config.keeper.interval_secs, 60);
    assert_eq!(config.protocol.fee_bps, 100);
    assert_eq!(config.protocol.decimals, 18);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::load(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(Error::Config(ConfigError::ReadFile(_)))));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let (_dir, path) = write_temp("config.toml", "[protocol\nowner = ");
    let result = Config::load(&path);
    assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
}

#[test]
fn missing_protocol_is_rejected() {
    let (_dir, path) = write_temp("config.toml", "[keeper]\ninterval_secs = 5\n");
    match Config::load(&path) {
        Err(Error::Config(ConfigError::MissingField { .. })) => {}
        Err(Error::Config(ConfigError::InvalidValue { field, .. })) => {
            assert!(field == "owner" || field == "oracle_resolver", "{field}");
        }
        other => panic!("expected missing identity, got {other:?}"),
    }
}

#[test]
fn fee_above_one_hundred_percent_is_rejected() {
    let toml = format!("{PROTOCOL}fee_bps = 10001\n");
    let (_dir, path) = write_temp("config.toml", &toml);
    match Config::load(&path) {
        Err(Error::Config(ConfigError::InvalidValue { field, reason })) => {
            assert_eq!(field, "protocol");
            assert!(reason.contains("10001"), "{reason}");
        }
        other => panic!("expected invalid fee, got {other:?}"),
    }
}

#[test]
fn default_min_stake_below_global_is_rejected() {
    let toml = format!("{PROTOCOL}global_min_stake = 1.0\ndefault_market_min_stake = 0.5\n");
    let (_dir, path) = write_temp("config.toml", &toml);
    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::InvalidValue {
            field: "protocol",
            ..
        }))
    ));
}

#[test]
fn over_precise_stake_is_rejected() {
    let toml = format!("{PROTOCOL}decimals = 2\nglobal_min_stake = 0.001\n");
    let (_dir, path) = write_temp("config.toml", &toml);
    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::InvalidValue {
            field: "global_min_stake",
            ..
        }))
    ));
}

#[test]
fn keeper_and_logging_are_validated() {
    let toml = format!("{PROTOCOL}\n[keeper]\ninterval_secs = 0\n");
    let (_dir, path) = write_temp("config.toml", &toml);
    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::InvalidValue {
            field: "interval_secs",
            ..
        }))
    ));

    let toml = format!("[logging]\nformat = \"xml\"\n{PROTOCOL}");
    let (_dir, path) = write_temp("config.toml", &toml);
    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::InvalidValue { field: "format", .. }))
    ));
}
