//! Configuration loading for both pipelines
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority, applied by each binary)
//! 2. Environment variable (applied by clap `env = ...`)
//! 3. TOML config file
//! 4. Compiled default (fallback, applied by each binary)
//!
//! The TOML file itself is located with the same tiering: an explicit
//! `--config` path, then `ECAL_CONFIG`, then `<config_dir>/ecal/<module>.toml`.
//! A missing default file is not an error; an explicit path that does not
//! exist is.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit TOML config file
pub const CONFIG_ENV_VAR: &str = "ECAL_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Pipeline A settings (optional)
    #[serde(default)]
    pub normalize: NormalizeConfig,

    /// Pipeline B settings (optional)
    #[serde(default)]
    pub aggregate: AggregateConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[normalize]` table: workbook cleaning and scoring
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct NormalizeConfig {
    /// Input workbook (.xlsx)
    #[serde(default)]
    pub workbook: Option<PathBuf>,

    /// Directory receiving the cleaned CSV files and diagnostics
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Directory receiving the narrative README.md
    #[serde(default)]
    pub docs_dir: Option<PathBuf>,

    /// Decimal places kept in the CO2e column; absent keeps full precision
    #[serde(default)]
    pub score_decimals: Option<u32>,
}

/// `[aggregate]` table: measurement fetch and chart
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AggregateConfig {
    #[serde(default)]
    pub api_url: Option<String>,

    /// Measurement API key (prefer the environment variable for secrets)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    /// Key inside `customerData` used to group measurements
    #[serde(default)]
    pub group_field: Option<String>,

    #[serde(default)]
    pub chart_path: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicit path from `--config` or `ECAL_CONFIG`
    Explicit(PathBuf),
    /// Per-module file under the platform config directory
    Default(PathBuf),
    /// No file found; compiled defaults only
    BuiltIn,
}

/// Configuration plus its provenance, so the caller can log it once tracing is up
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

/// Locates and loads the TOML config file for one module
pub struct ConfigResolver {
    module_name: String,
}

impl ConfigResolver {
    /// Create resolver for a module (e.g. "ecal-ns")
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
        }
    }

    /// Per-module config path under the platform config directory
    ///
    /// `~/.config/ecal/<module>.toml` on Linux, the equivalent elsewhere.
    pub fn default_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| {
            d.join("ecal")
                .join(format!("{}.toml", self.module_name))
        })
    }

    /// Load configuration
    ///
    /// `cli_path` is the `--config` argument, if given.
    pub fn load(&self, cli_path: Option<&Path>) -> Result<LoadedConfig> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_path {
            return load_explicit(path);
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return load_explicit(Path::new(&path));
            }
        }

        // Priority 3: Per-module default file (missing is fine)
        if let Some(path) = self.default_path() {
            if path.exists() {
                let config = load_toml_config(&path)?;
                return Ok(LoadedConfig {
                    config,
                    source: ConfigSource::Default(path),
                });
            }
        }

        // Priority 4: Compiled defaults
        Ok(LoadedConfig {
            config: TomlConfig::default(),
            source: ConfigSource::BuiltIn,
        })
    }
}

fn load_explicit(path: &Path) -> Result<LoadedConfig> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }
    let config = load_toml_config(path)?;
    Ok(LoadedConfig {
        config,
        source: ConfigSource::Explicit(path.to_path_buf()),
    })
}

/// Read and parse one TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Parse TOML text into a config
pub fn parse_toml_config(content: &str) -> std::result::Result<TomlConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Validate an inclusive date range
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(Error::InvalidInput(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    Ok(())
}
