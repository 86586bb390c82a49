//! Normalize & Score pipeline
//!
//! load → clean → score → validate → write, composed explicitly. Every sheet
//! is processed before anything is written, so a structural failure (missing
//! reference, undefined mean, missing column) leaves no partial output.

use crate::cleaning::{apply_rules, RuleContext};
use crate::error::Result;
use crate::factors::EmissionFactorTable;
use crate::loader::Workbook;
use crate::scoring::{score_table, RoundingPolicy, ScoreColumns};
use crate::sinks::{write_diagnostics, write_report, write_table_csv, DatasetDiagnostics, RunDiagnostics};
use crate::sources::{SourceSpec, FACTOR_KEY_COLUMN, REFERENCE_HEADER_ROW, REFERENCE_SHEET, SCORE_COLUMN, SOURCES};
use crate::table::Table;
use crate::validator::validate;
use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// File name of the JSON summary in the output directory
pub const DIAGNOSTICS_FILE: &str = "diagnostics.json";

/// Resolved settings for one run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub workbook: PathBuf,
    pub output_dir: PathBuf,
    /// Where README.md goes; `None` skips the narrative report
    pub docs_dir: Option<PathBuf>,
    pub rounding: RoundingPolicy,
}

/// One sheet after cleaning, scoring and validation
#[derive(Debug, Clone)]
pub struct ProcessedDataset {
    pub spec: SourceSpec,
    pub table: Table,
    pub diagnostics: DatasetDiagnostics,
}

/// Files produced by a run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub diagnostics: RunDiagnostics,
    pub csv_files: Vec<PathBuf>,
    pub diagnostics_file: PathBuf,
    pub report_file: Option<PathBuf>,
}

/// Clean, score and validate one sheet
pub fn process_source(
    spec: &SourceSpec,
    mut table: Table,
    reference: &Table,
    factors: &EmissionFactorTable,
    rounding: RoundingPolicy,
) -> Result<ProcessedDataset> {
    info!(source = spec.id, sheet = spec.sheet, records = table.len(), "Processing sheet");

    let cleaning = apply_rules(&mut table, spec.rules, &RuleContext { reference })?;
    let scoring = score_table(
        &mut table,
        ScoreColumns {
            quantity: spec.quantity_column,
            factor_key: FACTOR_KEY_COLUMN,
            score: SCORE_COLUMN,
        },
        factors,
        rounding,
    )?;
    let (table, validation) = validate(table, spec.output_file);

    Ok(ProcessedDataset {
        spec: *spec,
        table,
        diagnostics: DatasetDiagnostics {
            sheet: spec.sheet.to_string(),
            output_file: spec.output_file.to_string(),
            cleaning,
            scoring,
            validation,
        },
    })
}

/// Write CSVs, diagnostics and (optionally) the report for processed sheets
pub fn write_outputs(
    datasets: Vec<ProcessedDataset>,
    options: &PipelineOptions,
    factors: &EmissionFactorTable,
) -> Result<RunOutcome> {
    std::fs::create_dir_all(&options.output_dir)?;

    let mut csv_files = Vec::with_capacity(datasets.len());
    let mut summaries = Vec::with_capacity(datasets.len());
    for dataset in datasets {
        let path = options.output_dir.join(dataset.spec.output_file);
        write_table_csv(&dataset.table, &path)?;
        csv_files.push(path);
        summaries.push(dataset.diagnostics);
    }

    let diagnostics = RunDiagnostics {
        generated_at: Utc::now(),
        workbook: options.workbook.clone(),
        rounding: options.rounding,
        datasets: summaries,
    };

    let diagnostics_file = options.output_dir.join(DIAGNOSTICS_FILE);
    write_diagnostics(&diagnostics, &diagnostics_file)?;

    let report_file = match &options.docs_dir {
        Some(dir) => Some(write_report(dir, &diagnostics, factors)?),
        None => None,
    };

    for dataset in diagnostics.datasets_with_warnings() {
        warn!(dataset, "Output written with validation warnings; see {}", DIAGNOSTICS_FILE);
    }

    Ok(RunOutcome {
        diagnostics,
        csv_files,
        diagnostics_file,
        report_file,
    })
}

/// Run the whole pipeline against a workbook on disk
pub fn run(options: &PipelineOptions) -> Result<RunOutcome> {
    let factors = EmissionFactorTable::builtin()?;

    let mut workbook = Workbook::open(&options.workbook)?;
    debug!(sheets = ?workbook.sheet_names(), "Workbook sheets");

    let reference = workbook.load_sheet(REFERENCE_SHEET, REFERENCE_HEADER_ROW)?;

    let mut datasets = Vec::with_capacity(SOURCES.len());
    for spec in &SOURCES {
        let table = workbook.load_sheet(spec.sheet, spec.header_row)?;
        datasets.push(process_source(spec, table, &reference, &factors, options.rounding)?);
    }

    let outcome = write_outputs(datasets, options, &factors)?;
    info!(
        files = outcome.csv_files.len(),
        output_dir = %options.output_dir.display(),
        "CSV files have been created successfully"
    );
    Ok(outcome)
}
