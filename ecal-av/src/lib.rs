//! ecal-av - Aggregate & Visualize pipeline
//!
//! Fetches measurements for a date range, sums `resultValue` per grouping
//! attribute and draws the totals as a bar chart.

pub mod aggregator;
pub mod chart;
pub mod client;
pub mod config;
pub mod error;

pub use aggregator::{aggregate, totals_by_field, GroupTotals};
pub use client::{DateRange, Measurement, MeasurementClient};
pub use config::AggregateSettings;
pub use error::{Error, Result};

use chart::{render_bar_chart, ChartSpec};
use std::path::PathBuf;
use tracing::{info, warn};

/// What a run produced
#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    pub measurements: usize,
    pub totals: GroupTotals,
    /// `None` when there was nothing to plot
    pub chart_file: Option<PathBuf>,
}

/// Fetch, aggregate and chart
pub async fn run(settings: &AggregateSettings, api_key: String) -> Result<AggregateOutcome> {
    let client = MeasurementClient::new(settings.api_url.clone(), api_key, settings.timeout)?;
    let measurements = client.fetch(&settings.range).await?;

    let totals = totals_by_field(&measurements, &settings.group_field);
    if totals.skipped > 0 {
        warn!(
            skipped = totals.skipped,
            group_field = %settings.group_field,
            "Measurements without the grouping attribute were skipped"
        );
    }
    if totals.negative_values > 0 {
        warn!(
            negative_values = totals.negative_values,
            group_field = %settings.group_field,
            "Negative measurements contributed to group totals"
        );
    }
    for (group, total) in &totals.groups {
        info!(group = %group, total, "Group total");
    }

    let chart_file = if totals.is_empty() {
        warn!("No measurements to plot; chart not written");
        None
    } else {
        let spec = ChartSpec::for_range(&settings.group_field, &settings.range);
        Some(render_bar_chart(&totals.groups, &spec, &settings.chart_path)?)
    };

    Ok(AggregateOutcome {
        measurements: measurements.len(),
        totals,
        chart_file,
    })
}
