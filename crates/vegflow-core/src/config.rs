use crate::calendar::LANDSAT8_FIRST_YEAR;
use crate::error::{Result, VegflowError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for vegflow
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// Root directory datasets are written under
    pub data_dir: ConfigValue<PathBuf>,
    /// Ground resolution in meters per pixel
    pub resolution_m: ConfigValue<f64>,
    /// Tile side in pixels
    pub tile_size_px: ConfigValue<u32>,
    /// Concurrent (tile, month) jobs
    pub max_workers: ConfigValue<usize>,
    /// Earliest acquisition year accepted
    pub earliest_year: ConfigValue<i32>,
    /// Sampling scale used for tile validity statistics
    pub validity_scale_m: ConfigValue<f64>,
    /// Base URL of the imagery service
    pub imagery_url: ConfigValue<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            data_dir: ConfigValue::new(PathBuf::from("data"), ConfigSource::Default),
            resolution_m: ConfigValue::new(30.0, ConfigSource::Default),
            tile_size_px: ConfigValue::new(256, ConfigSource::Default),
            max_workers: ConfigValue::new(4, ConfigSource::Default),
            earliest_year: ConfigValue::new(LANDSAT8_FIRST_YEAR, ConfigSource::Default),
            validity_scale_m: ConfigValue::new(30.0, ConfigSource::Default),
            imagery_url: ConfigValue::new(
                "http://localhost:8080".to_string(),
                ConfigSource::Default,
            ),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| VegflowError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| VegflowError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(data_dir) = file_config.data_dir {
            self.data_dir.update(data_dir, ConfigSource::File);
        }

        if let Some(resolution_m) = file_config.resolution_m {
            self.resolution_m.update(positive("resolution_m", resolution_m)?, ConfigSource::File);
        }

        if let Some(tile_size_px) = file_config.tile_size_px {
            self.tile_size_px.update(non_zero("tile_size_px", tile_size_px)?, ConfigSource::File);
        }

        if let Some(max_workers) = file_config.max_workers {
            self.max_workers.update(non_zero("max_workers", max_workers)?, ConfigSource::File);
        }

        if let Some(earliest_year) = file_config.earliest_year {
            self.earliest_year.update(earliest_year, ConfigSource::File);
        }

        if let Some(scale) = file_config.validity_scale_m {
            self.validity_scale_m.update(positive("validity_scale_m", scale)?, ConfigSource::File);
        }

        if let Some(imagery_url) = file_config.imagery_url {
            self.imagery_url.update(imagery_url, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // VEGFLOW_DATA_DIR
        if let Ok(dir) = env::var("VEGFLOW_DATA_DIR") {
            self.data_dir.update(PathBuf::from(dir), ConfigSource::Environment);
        }

        // VEGFLOW_RESOLUTION_M
        if let Some(v) = parse_env("VEGFLOW_RESOLUTION_M", |s| positive_str("resolution_m", s)) {
            self.resolution_m.update(v, ConfigSource::Environment);
        }

        // VEGFLOW_TILE_SIZE_PX
        if let Some(v) = parse_env("VEGFLOW_TILE_SIZE_PX", |s| non_zero_str("tile_size_px", s)) {
            self.tile_size_px.update(v, ConfigSource::Environment);
        }

        // VEGFLOW_MAX_WORKERS
        if let Some(v) = parse_env("VEGFLOW_MAX_WORKERS", |s| non_zero_str("max_workers", s)) {
            self.max_workers.update(v, ConfigSource::Environment);
        }

        // VEGFLOW_EARLIEST_YEAR
        if let Some(v) = parse_env("VEGFLOW_EARLIEST_YEAR", |s| parse_value("earliest_year", s)) {
            self.earliest_year.update(v, ConfigSource::Environment);
        }

        // VEGFLOW_VALIDITY_SCALE_M
        if let Some(v) =
            parse_env("VEGFLOW_VALIDITY_SCALE_M", |s| positive_str("validity_scale_m", s))
        {
            self.validity_scale_m.update(v, ConfigSource::Environment);
        }

        // VEGFLOW_IMAGERY_URL
        if let Ok(url) = env::var("VEGFLOW_IMAGERY_URL") {
            self.imagery_url.update(url, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(data_dir) = overrides.data_dir {
            self.data_dir.update(data_dir, ConfigSource::Cli);
        }

        if let Some(resolution_m) = overrides.resolution_m {
            self.resolution_m.update(resolution_m, ConfigSource::Cli);
        }

        if let Some(tile_size_px) = overrides.tile_size_px {
            self.tile_size_px.update(tile_size_px, ConfigSource::Cli);
        }

        if let Some(max_workers) = overrides.max_workers {
            self.max_workers.update(max_workers, ConfigSource::Cli);
        }

        if let Some(imagery_url) = overrides.imagery_url {
            self.imagery_url.update(imagery_url, ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "data_dir".to_string(),
            (self.data_dir.value.display().to_string(), self.data_dir.source),
        );
        map.insert(
            "resolution_m".to_string(),
            (self.resolution_m.value.to_string(), self.resolution_m.source),
        );
        map.insert(
            "tile_size_px".to_string(),
            (self.tile_size_px.value.to_string(), self.tile_size_px.source),
        );
        map.insert(
            "max_workers".to_string(),
            (self.max_workers.value.to_string(), self.max_workers.source),
        );
        map.insert(
            "earliest_year".to_string(),
            (self.earliest_year.value.to_string(), self.earliest_year.source),
        );
        map.insert(
            "validity_scale_m".to_string(),
            (self.validity_scale_m.value.to_string(), self.validity_scale_m.source),
        );
        map.insert(
            "imagery_url".to_string(),
            (self.imagery_url.value.clone(), self.imagery_url.source),
        );

        map
    }
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    resolution_m: Option<f64>,
    tile_size_px: Option<u32>,
    max_workers: Option<usize>,
    earliest_year: Option<i32>,
    validity_scale_m: Option<f64>,
    imagery_url: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub resolution_m: Option<f64>,
    pub tile_size_px: Option<u32>,
    pub max_workers: Option<usize>,
    pub imagery_url: Option<String>,
}

fn parse_env<T>(var: &str, parse: impl Fn(&str) -> Result<T>) -> Option<T> {
    let raw = env::var(var).ok()?;
    match parse(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring {}='{}': {}", var, raw, e);
            None
        }
    }
}

fn parse_value<T: FromStr>(key: &str, s: &str) -> Result<T> {
    s.trim().parse().map_err(|_| VegflowError::ConfigInvalid {
        key: key.to_string(),
        reason: format!("cannot parse '{}'", s),
    })
}

fn positive(key: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(VegflowError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("must be a positive number, got {}", value),
        })
    }
}

fn positive_str(key: &str, s: &str) -> Result<f64> {
    positive(key, parse_value(key, s)?)
}

fn non_zero<T: PartialEq + Default + std::fmt::Display>(key: &str, value: T) -> Result<T> {
    if value == T::default() {
        Err(VegflowError::ConfigInvalid {
            key: key.to_string(),
            reason: "must be greater than 0".to_string(),
        })
    } else {
        Ok(value)
    }
}

fn non_zero_str<T: FromStr + PartialEq + Default + std::fmt::Display>(
    key: &str,
    s: &str,
) -> Result<T> {
    non_zero(key, parse_value(key, s)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.resolution_m.value, 30.0);
        assert_eq!(config.tile_size_px.value, 256);
        assert_eq!(config.max_workers.value, 4);
        assert_eq!(config.earliest_year.value, 2013);
        assert_eq!(config.data_dir.source, ConfigSource::Default);
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
data_dir = "/srv/vegflow"
resolution_m = 10.0
tile_size_px = 128
max_workers = 8
imagery_url = "http://imagery:9000"
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.data_dir.value, PathBuf::from("/srv/vegflow"));
        assert_eq!(config.data_dir.source, ConfigSource::File);
        assert_eq!(config.resolution_m.value, 10.0);
        assert_eq!(config.tile_size_px.value, 128);
        assert_eq!(config.max_workers.value, 8);
        assert_eq!(config.imagery_url.value, "http://imagery:9000");
        assert_eq!(config.earliest_year.source, ConfigSource::Default);
    }

    #[test]
    fn test_file_rejects_zero_tile_size() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "tile_size_px = 0").unwrap();

        let err = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, VegflowError::ConfigInvalid { ref key, .. } if key == "tile_size_px"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            tile_size_px: Some(64),
            max_workers: Some(2),
            ..Default::default()
        });

        assert_eq!(config.tile_size_px.value, 64);
        assert_eq!(config.tile_size_px.source, ConfigSource::Cli);
        assert_eq!(config.max_workers.value, 2);
        assert_eq!(config.resolution_m.source, ConfigSource::Default);
    }

    #[test]
    fn test_inspection_map() {
        let map = LayeredConfig::with_defaults().to_inspection_map();

        assert_eq!(map.len(), 7);
        let (tile_size, source) = &map["tile_size_px"];
        assert_eq!(tile_size, "256");
        assert_eq!(*source, ConfigSource::Default);
    }
}
