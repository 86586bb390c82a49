//! ecal-av (Aggregate & Visualize) - Main entry point
//!
//! Fetches measurements from the remote API and charts their totals per
//! facility (or any other customer attribute).

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use ecal_av::config::{obtain_api_key, AggregateOverrides, AggregateSettings};
use ecal_common::config::{ConfigResolver, ConfigSource};
use ecal_common::logging::init_tracing;
use ecal_common::BuildInfo;
use tracing::{error, info, warn};

const BUILD: BuildInfo = BuildInfo {
    display_name: "ECAL Aggregate & Visualize",
    crate_name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    git_hash: env!("GIT_HASH"),
    timestamp: env!("BUILD_TIMESTAMP"),
    profile: env!("BUILD_PROFILE"),
};

/// Command-line arguments for ecal-av
#[derive(Parser, Debug)]
#[command(name = "ecal-av")]
#[command(about = "Aggregate remote emission measurements and chart them")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config_dir>/ecal/ecal-av.toml)
    #[arg(short, long, env = "ECAL_CONFIG")]
    config: Option<PathBuf>,

    /// Measurement API key
    #[arg(long, env = "ECAL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Measurement API endpoint
    #[arg(long, env = "ECAL_API_URL")]
    api_url: Option<String>,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// customerData attribute to group by
    #[arg(short, long)]
    group_field: Option<String>,

    /// Output SVG file
    #[arg(long, env = "ECAL_CHART_PATH")]
    chart_path: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let loaded = ConfigResolver::new("ecal-av")
        .load(args.config.as_deref())
        .context("Failed to load configuration")?;
    let config = loaded.config;

    init_tracing(&config.logging).context("Failed to initialize logging")?;
    BUILD.log_startup();

    match &loaded.source {
        ConfigSource::Explicit(path) | ConfigSource::Default(path) => {
            info!("Config file: {}", path.display())
        }
        ConfigSource::BuiltIn => warn!("No config file found, using built-in defaults"),
    }

    let settings = AggregateSettings::resolve(
        AggregateOverrides {
            api_url: args.api_url,
            start_date: args.start_date,
            end_date: args.end_date,
            group_field: args.group_field,
            chart_path: args.chart_path,
            timeout_secs: args.timeout_secs,
        },
        &config.aggregate,
    )
    .context("Invalid aggregate settings")?;

    let (api_key, _) = {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        obtain_api_key(
            args.api_key.as_deref(),
            config.aggregate.api_key.as_deref(),
            &mut input,
            &mut output,
        )
        .context("Failed to obtain API key")?
    };

    info!("API: {}", settings.api_url);
    info!(
        "Range: {} to {}, grouped by {}",
        settings.range.start(),
        settings.range.end(),
        settings.group_field
    );

    let outcome = ecal_av::run(&settings, api_key)
        .await
        .context("Aggregate & Visualize pipeline failed")?;

    info!(
        "✓ {} measurements aggregated into {} groups",
        outcome.measurements,
        outcome.totals.groups.len()
    );
    if let Some(chart) = &outcome.chart_file {
        info!("✓ Chart: {}", chart.display());
    }

    Ok(())
}
