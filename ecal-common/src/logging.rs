//! Tracing initialisation and build identification

use crate::config::LoggingConfig;
use crate::{Error, Result};
use std::fs::OpenOptions;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Build identification captured by each binary's build.rs
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    /// Human-readable module name
    pub display_name: &'static str,
    pub crate_name: &'static str,
    pub version: &'static str,
    pub git_hash: &'static str,
    pub timestamp: &'static str,
    pub profile: &'static str,
}

impl BuildInfo {
    /// Log the startup banner; call immediately after [`init_tracing`]
    pub fn log_startup(&self) {
        info!(
            "Starting {} ({}) v{} [{}] built {} ({})",
            self.display_name,
            self.crate_name,
            self.version,
            self.git_hash,
            self.timestamp,
            self.profile
        );
    }
}

/// Parse a configured log level name
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(level.trim())
        .map_err(|_| Error::Config(format!("Invalid log level: {}", level)))
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise the configured level applies.
/// Logs go to stderr unless `logging.file` is set, in which case they are
/// appended to that file without ANSI colours.
pub fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let level = parse_level(&logging.level)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        None => {
            builder.with_writer(std::io::stderr).init();
        }
    }

    Ok(())
}
