//! Configuration resolution for ecal-av
//!
//! Settings: CLI/ENV → TOML `[aggregate]` → compiled default.
//! API key: CLI/ENV → TOML → interactive prompt.

use crate::chart::DEFAULT_CHART_PATH;
use crate::client::{DateRange, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::error::Result;
use chrono::NaiveDate;
use ecal_common::config::AggregateConfig;
use ecal_common::Error as CommonError;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_GROUP_FIELD: &str = "Facility";
pub const API_KEY_PROMPT: &str = "Please enter your API_KEY : ";

/// Where the API key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    CommandLine,
    Toml,
    Prompt,
}

/// A key is usable if it has any non-whitespace content
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Pick the API key from the non-interactive tiers
///
/// **Priority:** CLI/ENV → TOML. Returns `None` when neither holds a
/// valid key; the caller may then prompt.
pub fn resolve_api_key(cli_key: Option<&str>, toml_key: Option<&str>) -> Option<(String, KeySource)> {
    let cli_key = cli_key.filter(|k| is_valid_key(k));
    let toml_key = toml_key.filter(|k| is_valid_key(k));

    if cli_key.is_some() && toml_key.is_some() {
        warn!("API key found in multiple sources: command line/environment, TOML. Using command line/environment (highest priority).");
    }

    if let Some(key) = cli_key {
        info!("API key loaded from command line/environment");
        return Some((key.trim().to_string(), KeySource::CommandLine));
    }
    if let Some(key) = toml_key {
        info!("API key loaded from TOML config");
        return Some((key.trim().to_string(), KeySource::Toml));
    }
    None
}

/// Ask for the key on `output` and read one line from `input`
///
/// Returns `None` on end of input or a blank answer.
pub fn prompt_api_key<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<String>> {
    write!(output, "{}", API_KEY_PROMPT)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let key = line.trim();
    Ok(is_valid_key(key).then(|| key.to_string()))
}

/// Full key resolution including the stdin prompt
pub fn obtain_api_key<R: BufRead, W: Write>(
    cli_key: Option<&str>,
    toml_key: Option<&str>,
    input: &mut R,
    output: &mut W,
) -> Result<(String, KeySource)> {
    if let Some(found) = resolve_api_key(cli_key, toml_key) {
        return Ok(found);
    }
    match prompt_api_key(input, output)? {
        Some(key) => {
            info!("API key entered interactively");
            Ok((key, KeySource::Prompt))
        }
        None => Err(CommonError::Config(
            "API key not configured. Please configure using one of:\n\
             1. --api-key <KEY> or ECAL_API_KEY environment variable\n\
             2. api_key in the [aggregate] section of the TOML config\n\
             3. Enter it at the interactive prompt"
                .to_string(),
        )
        .into()),
    }
}

/// Command-line overrides; `None` falls through to TOML, then defaults
#[derive(Debug, Clone, Default)]
pub struct AggregateOverrides {
    pub api_url: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub group_field: Option<String>,
    pub chart_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// Resolved settings for one run (API key excluded)
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSettings {
    pub api_url: String,
    pub range: DateRange,
    pub group_field: String,
    pub chart_path: PathBuf,
    pub timeout: Duration,
}

impl AggregateSettings {
    pub fn resolve(cli: AggregateOverrides, toml: &AggregateConfig) -> Result<Self> {
        let start = match cli.start_date.or(toml.start_date) {
            Some(date) => date,
            None => default_date(2022, 1, 1)?,
        };
        let end = match cli.end_date.or(toml.end_date) {
            Some(date) => date,
            None => default_date(2022, 12, 31)?,
        };

        let group_field = cli
            .group_field
            .or_else(|| toml.group_field.clone())
            .unwrap_or_else(|| DEFAULT_GROUP_FIELD.to_string());
        if group_field.trim().is_empty() {
            return Err(CommonError::InvalidInput("group field must not be empty".to_string()).into());
        }

        let timeout_secs = cli
            .timeout_secs
            .or(toml.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(CommonError::InvalidInput("timeout_secs must be at least 1".to_string()).into());
        }

        Ok(Self {
            api_url: cli
                .api_url
                .or_else(|| toml.api_url.clone())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            range: DateRange::new(start, end)?,
            group_field,
            chart_path: cli
                .chart_path
                .or_else(|| toml.chart_path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CHART_PATH)),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn default_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| CommonError::InvalidInput(format!("invalid date {}-{}-{}", year, month, day)).into())
}
