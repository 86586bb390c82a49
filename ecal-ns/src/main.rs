//! ecal-ns (Normalize & Score) - Main entry point
//!
//! Batch tool: cleans the activity workbook, computes CO2e per record and
//! writes cleaned CSVs, `diagnostics.json` and a narrative README.md.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ecal_common::config::{ConfigResolver, ConfigSource};
use ecal_common::logging::init_tracing;
use ecal_common::BuildInfo;
use ecal_ns::{PipelineOptions, RoundingPolicy};
use tracing::{error, info, warn};

const DEFAULT_WORKBOOK: &str = "./data/activity_data_sweep-input.xlsx";
const DEFAULT_OUTPUT_DIR: &str = "./output";
const DEFAULT_DOCS_DIR: &str = "./docs";

const BUILD: BuildInfo = BuildInfo {
    display_name: "ECAL Normalize & Score",
    crate_name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    git_hash: env!("GIT_HASH"),
    timestamp: env!("BUILD_TIMESTAMP"),
    profile: env!("BUILD_PROFILE"),
};

/// Command-line arguments for ecal-ns
#[derive(Parser, Debug)]
#[command(name = "ecal-ns")]
#[command(about = "Clean activity data and compute CO2e per record")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config_dir>/ecal/ecal-ns.toml)
    #[arg(short, long, env = "ECAL_CONFIG")]
    config: Option<PathBuf>,

    /// Input workbook (.xlsx)
    #[arg(short, long, env = "ECAL_WORKBOOK")]
    workbook: Option<PathBuf>,

    /// Directory for cleaned CSV files and diagnostics.json
    #[arg(short, long, env = "ECAL_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Directory for the narrative README.md
    #[arg(long, env = "ECAL_DOCS_DIR")]
    docs_dir: Option<PathBuf>,

    /// Round CO2e to this many decimal places (default: full precision)
    #[arg(long)]
    score_decimals: Option<u32>,

    /// Skip writing the narrative report
    #[arg(long)]
    no_report: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let loaded = ConfigResolver::new("ecal-ns")
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

    // CLI/ENV > TOML > compiled default
    let normalize = config.normalize;
    let options = PipelineOptions {
        workbook: args
            .workbook
            .or(normalize.workbook)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKBOOK)),
        output_dir: args
            .output_dir
            .or(normalize.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        docs_dir: if args.no_report {
            None
        } else {
            Some(
                args.docs_dir
                    .or(normalize.docs_dir)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCS_DIR)),
            )
        },
        rounding: RoundingPolicy::from_decimals(args.score_decimals.or(normalize.score_decimals)),
    };

    info!("Workbook: {}", options.workbook.display());
    info!("Output directory: {}", options.output_dir.display());

    let outcome = ecal_ns::run(&options).context("Normalize & Score pipeline failed")?;

    info!(
        "✓ {} CSV files written to {}",
        outcome.csv_files.len(),
        options.output_dir.display()
    );
    info!("✓ Diagnostics: {}", outcome.diagnostics_file.display());
    if let Some(report) = &outcome.report_file {
        info!("✓ Report: {}", report.display());
    }

    Ok(())
}
