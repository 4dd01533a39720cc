//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use vegflow_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};

const ENV_VARS: [&str; 7] = [
    "VEGFLOW_DATA_DIR",
    "VEGFLOW_RESOLUTION_M",
    "VEGFLOW_TILE_SIZE_PX",
    "VEGFLOW_MAX_WORKERS",
    "VEGFLOW_EARLIEST_YEAR",
    "VEGFLOW_VALIDITY_SCALE_M",
    "VEGFLOW_IMAGERY_URL",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", content).unwrap();
    file
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let file = config_file("tile_size_px = 128\nmax_workers = 2\n");

    env::set_var("VEGFLOW_TILE_SIZE_PX", "512");

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.tile_size_px.value, 512);
    assert_eq!(config.tile_size_px.source, ConfigSource::Environment);
    assert_eq!(config.max_workers.value, 2);
    assert_eq!(config.max_workers.source, ConfigSource::File);

    clear_env();
}

#[test]
#[serial]
fn test_env_loaded_before_file_still_wins() {
    clear_env();
    let file = config_file("resolution_m = 10.0\n");

    env::set_var("VEGFLOW_RESOLUTION_M", "15");

    let config = LayeredConfig::with_defaults()
        .load_from_env()
        .load_from_file(file.path())
        .unwrap();

    assert_eq!(config.resolution_m.value, 15.0);
    assert_eq!(config.resolution_m.source, ConfigSource::Environment);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_everything() {
    clear_env();
    let file = config_file("data_dir = \"/srv/file\"\n");

    env::set_var("VEGFLOW_DATA_DIR", "/srv/env");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();
    config.update_from_cli(CliConfigOverrides {
        data_dir: Some(PathBuf::from("/srv/cli")),
        ..Default::default()
    });

    assert_eq!(config.data_dir.value, PathBuf::from("/srv/cli"));
    assert_eq!(config.data_dir.source, ConfigSource::Cli);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_env_values_are_ignored() {
    clear_env();

    env::set_var("VEGFLOW_MAX_WORKERS", "0");
    env::set_var("VEGFLOW_RESOLUTION_M", "fast");
    env::set_var("VEGFLOW_VALIDITY_SCALE_M", "-30");
    env::set_var("VEGFLOW_EARLIEST_YEAR", "2015");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.max_workers.value, 4);
    assert_eq!(config.max_workers.source, ConfigSource::Default);
    assert_eq!(config.resolution_m.value, 30.0);
    assert_eq!(config.validity_scale_m.value, 30.0);
    assert_eq!(config.earliest_year.value, 2015);
    assert_eq!(config.earliest_year.source, ConfigSource::Environment);

    clear_env();
}

#[test]
fn test_missing_file_is_an_error() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/vegflow.toml");
    assert!(result.is_err());
}

#[test]
fn test_malformed_toml_is_an_error() {
    let file = config_file("tile_size_px = \"large\"");
    assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());
}
