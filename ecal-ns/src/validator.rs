//! Post-scoring data validation
//!
//! Three independent, non-fatal checks:
//! 1. **Duplicates**: identical records are collapsed to their first copy
//! 2. **Completeness**: missing cells are counted
//! 3. **Sign**: negative numeric cells are counted
//!
//! Findings are returned as a [`ValidationReport`] and logged as warnings;
//! the (deduplicated) table is always produced.

use crate::table::Table;
use crate::value::Value;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

/// Outcome of validating one dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub dataset: String,
    pub records_in: usize,
    pub records_out: usize,
    pub duplicates_removed: usize,
    pub missing_cells: usize,
    pub negative_cells: usize,
}

impl ValidationReport {
    pub fn has_missing(&self) -> bool {
        self.missing_cells > 0
    }

    pub fn has_negatives(&self) -> bool {
        self.negative_cells > 0
    }

    pub fn is_clean(&self) -> bool {
        self.duplicates_removed == 0 && !self.has_missing() && !self.has_negatives()
    }
}

/// Validate `table`, labelling findings with `dataset`
pub fn validate(mut table: Table, dataset: &str) -> (Table, ValidationReport) {
    let records_in = table.len();

    let mut seen = HashSet::with_capacity(records_in);
    let kept: Vec<_> = table
        .records()
        .iter()
        .filter(|record| seen.insert(record.key()))
        .cloned()
        .collect();
    table.set_records(kept);

    let cells = || table.records().iter().flat_map(|r| r.values().iter());
    let missing_cells = cells().filter(|v| v.is_missing()).count();
    let negative_cells = cells()
        .filter(|v| matches!(v, Value::Number(x) if *x < 0.0))
        .count();

    let report = ValidationReport {
        dataset: dataset.to_string(),
        records_in,
        records_out: table.len(),
        duplicates_removed: records_in - table.len(),
        missing_cells,
        negative_cells,
    };

    if report.duplicates_removed > 0 {
        info!(
            dataset,
            removed = report.duplicates_removed,
            "Duplicate records removed"
        );
    }
    if report.has_missing() {
        warn!(dataset, cells = report.missing_cells, "Missing values found in {}", dataset);
    }
    if report.has_negatives() {
        warn!(dataset, cells = report.negative_cells, "Negative values found in {}", dataset);
    }

    (table, report)
}
