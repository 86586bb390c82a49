//! JSON diagnostic summary

use crate::cleaning::CleaningReport;
use crate::error::Result;
use crate::scoring::{RoundingPolicy, ScoringReport};
use crate::validator::ValidationReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything recorded about one dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetDiagnostics {
    pub sheet: String,
    pub output_file: String,
    pub cleaning: CleaningReport,
    pub scoring: ScoringReport,
    pub validation: ValidationReport,
}

/// Summary of a full Normalize & Score run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunDiagnostics {
    pub generated_at: DateTime<Utc>,
    pub workbook: PathBuf,
    pub rounding: RoundingPolicy,
    pub datasets: Vec<DatasetDiagnostics>,
}

impl RunDiagnostics {
    pub fn total_duplicates_removed(&self) -> usize {
        self.datasets
            .iter()
            .map(|d| d.validation.duplicates_removed)
            .sum()
    }

    /// Datasets with at least one validation finding
    pub fn datasets_with_warnings(&self) -> Vec<&str> {
        self.datasets
            .iter()
            .filter(|d| d.validation.has_missing() || d.validation.has_negatives())
            .map(|d| d.validation.dataset.as_str())
            .collect()
    }
}

/// Write `diagnostics` as pretty-printed JSON
pub fn write_diagnostics(diagnostics: &RunDiagnostics, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(diagnostics)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), "Diagnostics written");
    Ok(())
}
