//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use vegflow_core::config::{CliConfigOverrides, LayeredConfig};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "vegflow.toml";

/// Load defaults, the config file, the environment and CLI overrides, in
/// increasing precedence.
///
/// An explicit `config_path` must exist; the default file is optional.
pub fn load_config(
    config_path: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    match config_file(config_path) {
        Some(path) => {
            config = config
                .load_from_file(&path)
                .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
            tracing::debug!(path = %path.display(), "Loaded configuration file");
        }
        None => tracing::debug!("No configuration file, using defaults"),
    }

    let mut config = config.load_from_env();
    config.update_from_cli(overrides);
    Ok(config)
}

fn config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    }
}
