//! Configuration loading and typed config structures for the Sprout farm.
//!
//! The canonical configuration lives in `sprout-config.yaml` at the project
//! root. Every section and field is optional; anything left out takes the
//! default shown below.
//!
//! ```yaml
//! grid: { rows: 10, columns: 15 }
//! economy: { starting_gold: 100 }
//! save:
//!   batch_delay_ms: 15000
//!   change_threshold: 25
//!   time_threshold_ms: 45000
//!   load_cooldown_ms: 3000
//! timing: { tick_interval_ms: 1000, max_catch_up_ticks: 5 }
//! storage: { data_dir: "./farm-data" }
//! user: { id: "local-player" }
//! logging: { level: "info", json: false }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sprout_types::{CropInfo, STARTING_GOLD};
use sprout_world::{CropCatalog, DEFAULT_COLUMNS, DEFAULT_ROWS};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an unusable farm.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level farm configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FarmConfig {
    /// Grid dimensions.
    #[serde(default)]
    pub grid: GridConfig,

    /// Wallet settings for new farms.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// The crop catalog.
    #[serde(default = "default_crops")]
    pub crops: Vec<CropInfo>,

    /// Save scheduler thresholds.
    #[serde(default)]
    pub save: SaveConfig,

    /// Tick timing.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Where documents are stored.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Which user to log in as at startup.
    #[serde(default)]
    pub user: UserConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            economy: EconomyConfig::default(),
            crops: default_crops(),
            save: SaveConfig::default(),
            timing: TimingConfig::default(),
            storage: StorageConfig::default(),
            user: UserConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl FarmConfig {
    /// Load configuration from a YAML file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, and
    /// [`ConfigError::Invalid`] if the values are unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML and
    /// [`ConfigError::Invalid`] if the values are unusable.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override storage and user settings with environment variables when set.
    ///
    /// `SPROUT_DATA_DIR` replaces the data directory and `SPROUT_USER` the
    /// startup user id.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SPROUT_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("SPROUT_USER") {
            self.user.id = val;
        }
    }

    /// Check the values that cannot be expressed in the types.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty grid, a zero tick
    /// interval or catch-up cap, a zero change threshold, or a bad catalog.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            reason: reason.to_owned(),
        };
        if self.grid.rows == 0 || self.grid.columns == 0 {
            return Err(invalid("grid rows and columns must be at least 1"));
        }
        if self.timing.tick_interval_ms == 0 {
            return Err(invalid("timing.tick_interval_ms must be at least 1"));
        }
        if self.timing.max_catch_up_ticks == 0 {
            return Err(invalid("timing.max_catch_up_ticks must be at least 1"));
        }
        if self.save.change_threshold == 0 {
            return Err(invalid("save.change_threshold must be at least 1"));
        }
        if self.user.id.trim().is_empty() {
            return Err(invalid("user.id must not be blank"));
        }
        self.catalog().map(|_| ())
    }

    /// Build the validated crop catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the crop list is rejected.
    pub fn catalog(&self) -> Result<CropCatalog, ConfigError> {
        CropCatalog::new(self.crops.clone()).map_err(|e| ConfigError::Invalid {
            reason: e.to_string(),
        })
    }
}

/// Grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    /// Number of rows.
    #[serde(default = "default_rows")]
    pub rows: u32,

    /// Number of columns. Tile positions are derived from this.
    #[serde(default = "default_columns")]
    pub columns: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            columns: default_columns(),
        }
    }
}

/// Wallet settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Gold a brand-new farm starts with.
    #[serde(default = "default_starting_gold")]
    pub starting_gold: u64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_gold: default_starting_gold(),
        }
    }
}

/// Save scheduler thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SaveConfig {
    /// Delay between the first batched change and its flush.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Pending change count that forces an immediate flush.
    #[serde(default = "default_change_threshold")]
    pub change_threshold: u32,

    /// Time since the last successful save that makes a smart change flush.
    #[serde(default = "default_time_threshold_ms")]
    pub time_threshold_ms: u64,

    /// Window after load during which automatic flushes are held back.
    #[serde(default = "default_load_cooldown_ms")]
    pub load_cooldown_ms: u64,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            batch_delay_ms: default_batch_delay_ms(),
            change_threshold: default_change_threshold(),
            time_threshold_ms: default_time_threshold_ms(),
            load_cooldown_ms: default_load_cooldown_ms(),
        }
    }
}

/// Tick timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Real-time milliseconds per growth tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Most ticks replayed after the run loop stalls.
    #[serde(default = "default_max_catch_up_ticks")]
    pub max_catch_up_ticks: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_catch_up_ticks: default_max_catch_up_ticks(),
        }
    }
}

/// Document storage location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON file per user.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Startup identity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserConfig {
    /// User id logged in at startup.
    #[serde(default = "default_user_id")]
    pub id: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_rows() -> u32 {
    DEFAULT_ROWS
}

const fn default_columns() -> u32 {
    DEFAULT_COLUMNS
}

const fn default_starting_gold() -> u64 {
    STARTING_GOLD
}

fn default_crops() -> Vec<CropInfo> {
    CropCatalog::default().iter().cloned().collect()
}

const fn default_batch_delay_ms() -> u64 {
    15_000
}

const fn default_change_threshold() -> u32 {
    25
}

const fn default_time_threshold_ms() -> u64 {
    45_000
}

const fn default_load_cooldown_ms() -> u64 {
    3_000
}

const fn default_tick_interval_ms() -> u64 {
    1_000
}

const fn default_max_catch_up_ticks() -> u32 {
    5
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./farm-data")
}

fn default_user_id() -> String {
    String::from("local-player")
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = FarmConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid.rows, 10);
        assert_eq!(config.grid.columns, 15);
        assert_eq!(config.economy.starting_gold, 100);
        assert_eq!(config.save.change_threshold, 25);
        assert_eq!(config.save.batch_delay_ms, 15_000);
        assert_eq!(config.crops.len(), 4);
    }

    #[test]
    fn empty_yaml_gives_defaults() {
        let parsed = FarmConfig::parse("{}").unwrap();
        assert_eq!(parsed.grid, GridConfig::default());
        assert_eq!(parsed.save, SaveConfig::default());
        assert_eq!(parsed.crops, FarmConfig::default().crops);
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r#"
grid:
  rows: 4
save:
  change_threshold: 50
  time_threshold_ms: 60000
crops:
  - name: "potato"
    icon: "P"
    sell_price: 3
    grow_duration_secs: 6
logging:
  json: true
"#;
        let config = FarmConfig::parse(yaml).unwrap();
        assert_eq!(config.grid.rows, 4);
        assert_eq!(config.grid.columns, 15);
        assert_eq!(config.save.change_threshold, 50);
        assert_eq!(config.save.batch_delay_ms, 15_000);
        assert_eq!(config.crops.len(), 1);
        assert_eq!(config.crops[0].name, "potato");
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.require("potato").unwrap().sell_price, 3);
    }

    #[test]
    fn zero_duration_crop_is_invalid() {
        let yaml = r#"
crops:
  - name: "weed"
    icon: ""
    sell_price: 0
    grow_duration_secs: 0
"#;
        assert!(matches!(
            FarmConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn empty_grid_is_invalid() {
        assert!(FarmConfig::parse("grid: { columns: 0 }").is_err());
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        assert!(matches!(
            FarmConfig::parse("grid: [1, 2"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
