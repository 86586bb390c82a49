//! Integration tests for the Normalize & Score pipeline
//!
//! Tests cover:
//! - Procurement: aluminium ID patch, t → kg, comma decimals, CO2e
//! - Travel: transport remap, unit coercion, duplicate removal
//! - Energy: conditional fill, unit coercion, outlier substitution
//! - Structural failures abort before any file is written
//! - Output files (CSV, diagnostics.json, README.md)

use ecal_ns::pipeline::{process_source, write_outputs, ProcessedDataset, DIAGNOSTICS_FILE};
use ecal_ns::sources::{ENERGY, ENERGY_OUTLIER, PROCUREMENT, TRAVEL};
use ecal_ns::{EmissionFactorTable, Error, PipelineOptions, RoundingPolicy, Table, Value};
use tempfile::TempDir;

fn t(s: &str) -> Value {
    Value::text(s)
}

fn n(x: f64) -> Value {
    Value::Number(x)
}

/// Test helper: EF reference sheet
fn reference() -> Table {
    Table::from_rows(
        "EF",
        &["Emission Factor ID", "Emission Factor Name"],
        vec![
            vec![n(259795.0), t("Steel, hot rolled")],
            vec![n(3360917.0), t("Aluminum, primary ingot")],
        ],
    )
}

/// Test helper: "Procurement Castel" sheet
fn procurement() -> Table {
    Table::from_rows(
        "Procurement Castel",
        &["Material", "Quantity in kg", "Unit", "Emission Factor ID"],
        vec![
            vec![t("Steel"), n(2.0), t("t"), n(259795.0)],
            vec![t("Aluminium sheet"), t("12,5"), t("kg"), t("-")],
            vec![t("Glass"), t("12,5,6"), t("kg"), n(6281066.0)],
            vec![t("Paper"), n(10.0), t("kg"), n(999.0)],
        ],
    )
}

/// Test helper: "CONCUR 2023 Cars Inc" sheet
fn travel() -> Table {
    Table::from_rows(
        "CONCUR 2023 Cars Inc",
        &["Employee", "Transport", "Quantity", "Unit", "Emission Factor ID"],
        vec![
            vec![t("E1"), t("Air"), n(1000.0), t("km"), Value::Missing],
            vec![t("E2"), t("Train"), n(500.0), t("p.km"), Value::Missing],
            vec![t("E1"), t("Air"), n(1000.0), t("km"), Value::Missing],
            vec![t("E3"), t("Boat"), n(50.0), Value::Missing, Value::Missing],
        ],
    )
}

/// Test helper: "Energy data" sheet
fn energy() -> Table {
    Table::from_rows(
        "Energy data",
        &["Country", "Location", "Type", "Status", "%missing", "Quantity", "Unit", "Emission Factor ID"],
        vec![
            vec![t("France"), t("FR Offices"), t("Gas"), t("Complete"), Value::Missing, n(10.0), t("MWh"), n(6281843.0)],
            vec![t("France"), t("FR Offices"), t("Gas"), t("Complete"), n(0.1), n(10.0), t("kWh"), n(6281843.0)],
            vec![t("France"), t("FR Offices"), t("Gas"), t("Partial"), Value::Missing, n(ENERGY_OUTLIER), t("kWh"), n(6281843.0)],
            vec![t("France"), t("FR Offices"), t("Gas"), t("Complete"), n(0.0), n(12.0), t("kWh"), n(6281843.0)],
            vec![t("France"), t("FR Offices"), t("Electricity"), t("Complete"), n(0.0), n(40.0), t("kWh"), n(6626527.0)],
        ],
    )
}

fn factors() -> EmissionFactorTable {
    EmissionFactorTable::builtin().unwrap()
}

fn cell<'a>(table: &'a Table, row: usize, column: &str) -> &'a Value {
    table.column(column).unwrap()[row]
}

fn process_all(rounding: RoundingPolicy) -> Vec<ProcessedDataset> {
    let reference = reference();
    let factors = factors();
    vec![
        process_source(&PROCUREMENT, procurement(), &reference, &factors, rounding).unwrap(),
        process_source(&TRAVEL, travel(), &reference, &factors, rounding).unwrap(),
        process_source(&ENERGY, energy(), &reference, &factors, rounding).unwrap(),
    ]
}

// =============================================================================
// Procurement
// =============================================================================

#[test]
fn test_procurement_cleaning_and_scoring() {
    let datasets = process_all(RoundingPolicy::Full);
    let p = &datasets[0];
    let table = &p.table;

    // t → kg, then scored with factor 1700
    assert_eq!(*cell(table, 0, "Quantity in kg"), n(2000.0));
    assert_eq!(*cell(table, 0, "Unit"), t("kg"));
    assert_eq!(*cell(table, 0, "CO2e"), n(2000.0 * 1700.0));

    // Aluminium sentinel patched from EF sheet; comma decimal parsed
    assert_eq!(*cell(table, 1, "Emission Factor ID"), n(3360917.0));
    assert_eq!(*cell(table, 1, "Quantity in kg"), n(12.5));
    assert_eq!(*cell(table, 1, "CO2e"), n(12.5 * 0.18387));

    // Malformed quantity → missing quantity → missing score
    assert_eq!(*cell(table, 2, "Quantity in kg"), Value::Missing);
    assert_eq!(*cell(table, 2, "CO2e"), Value::Missing);

    // Unknown factor ID → missing score, not zero
    assert_eq!(*cell(table, 3, "CO2e"), Value::Missing);

    let d = &p.diagnostics;
    assert_eq!(d.cleaning.keys_patched, 1);
    assert_eq!(d.cleaning.units_converted, 1);
    assert_eq!(d.cleaning.parse_failures, 1);
    assert_eq!(d.scoring.scored, 2);
    assert_eq!(d.scoring.unresolved_keys, 1);
    assert_eq!(d.scoring.invalid_quantities, 1);
    assert!(d.validation.has_missing());
    assert_eq!(d.validation.dataset, "Procurement Castel_Cleaned.csv");
}

#[test]
fn test_missing_aluminium_reference_aborts() {
    let reference = Table::from_rows(
        "EF",
        &["Emission Factor ID", "Emission Factor Name"],
        vec![vec![n(259795.0), t("Steel")]],
    );
    let result = process_source(
        &PROCUREMENT,
        procurement(),
        &reference,
        &factors(),
        RoundingPolicy::Full,
    );
    assert!(matches!(result, Err(Error::MissingReference { .. })));
}

#[test]
fn test_missing_column_aborts() {
    let table = Table::from_rows("Procurement Castel", &["Material"], vec![vec![t("Steel")]]);
    let result = process_source(&PROCUREMENT, table, &reference(), &factors(), RoundingPolicy::Full);
    assert!(matches!(result, Err(Error::MissingColumn { .. })));
}

// =============================================================================
// Travel
// =============================================================================

#[test]
fn test_travel_remap_coerce_and_dedup() {
    let datasets = process_all(RoundingPolicy::Full);
    let p = &datasets[1];
    let table = &p.table;

    // Row E1/Air appears twice; only the first is kept
    assert_eq!(table.len(), 3);
    assert_eq!(p.diagnostics.validation.duplicates_removed, 1);

    assert_eq!(*cell(table, 0, "Emission Factor ID"), n(262740.0));
    assert_eq!(*cell(table, 1, "Emission Factor ID"), n(5424149.0));
    assert!(table.column("Unit").unwrap().iter().all(|u| **u == t("p.km")));

    // Unmapped mode: key stays undefined and the score is missing
    assert_eq!(*cell(table, 2, "Emission Factor ID"), Value::Missing);
    assert_eq!(*cell(table, 2, "CO2e"), Value::Missing);

    assert_eq!(p.diagnostics.cleaning.unmapped_categories, 1);
    assert_eq!(p.diagnostics.cleaning.units_coerced, 3);
}

// =============================================================================
// Energy
// =============================================================================

#[test]
fn test_energy_fill_units_and_outlier() {
    let datasets = process_all(RoundingPolicy::Full);
    let p = &datasets[2];
    let table = &p.table;

    // Filled only where Status == Complete
    assert_eq!(*cell(table, 0, "%missing"), n(0.0));
    assert_eq!(*cell(table, 2, "%missing"), Value::Missing);

    assert!(table.column("Unit").unwrap().iter().all(|u| **u == t("kWh")));

    // Mean of 10, 10, 12; the electricity row is outside the subset
    let replaced = cell(table, 2, "Quantity").as_number().unwrap();
    assert!((replaced - 32.0 / 3.0).abs() < 1e-9);
    assert_eq!(p.diagnostics.cleaning.outliers_replaced, 1);
    assert_eq!(p.diagnostics.cleaning.values_filled, 1);
}

#[test]
fn test_rounding_policy_applies_to_scores() {
    let datasets = process_all(RoundingPolicy::Decimals(2));
    let energy = &datasets[2].table;

    // 32/3 × 0.656101 = 6.99841...
    assert_eq!(*cell(energy, 2, "CO2e"), n(7.0));
}

// =============================================================================
// Outputs
// =============================================================================

#[test]
fn test_outputs_written() {
    let temp_dir = TempDir::new().unwrap();
    let options = PipelineOptions {
        workbook: temp_dir.path().join("activity.xlsx"),
        output_dir: temp_dir.path().join("output"),
        docs_dir: Some(temp_dir.path().join("docs")),
        rounding: RoundingPolicy::Full,
    };

    let outcome = write_outputs(process_all(RoundingPolicy::Full), &options, &factors()).unwrap();

    assert_eq!(outcome.csv_files.len(), 3);
    for path in &outcome.csv_files {
        assert!(path.exists(), "missing {}", path.display());
    }

    let travel_csv =
        std::fs::read_to_string(options.output_dir.join("CONCUR 2023 Cars Inc_Cleaned.csv")).unwrap();
    let mut lines = travel_csv.lines();
    assert_eq!(
        lines.next(),
        Some("Employee,Transport,Quantity,Unit,Emission Factor ID,CO2e")
    );
    assert_eq!(lines.next(), Some("E1,Air,1000,p.km,262740,305"));
    assert_eq!(lines.count(), 2);

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(options.output_dir.join(DIAGNOSTICS_FILE)).unwrap(),
    )
    .unwrap();
    assert_eq!(json["datasets"].as_array().unwrap().len(), 3);
    assert_eq!(json["datasets"][1]["validation"]["duplicates_removed"], 1);
    assert_eq!(json["datasets"][2]["cleaning"]["outliers_replaced"], 1);

    let report = outcome.report_file.unwrap();
    let text = std::fs::read_to_string(report).unwrap();
    assert!(text.contains("| CONCUR 2023 Cars Inc_Cleaned.csv | 3 | 1 |"));
}

#[test]
fn test_no_report_when_docs_dir_unset() {
    let temp_dir = TempDir::new().unwrap();
    let options = PipelineOptions {
        workbook: temp_dir.path().join("activity.xlsx"),
        output_dir: temp_dir.path().join("output"),
        docs_dir: None,
        rounding: RoundingPolicy::Full,
    };

    let outcome = write_outputs(process_all(RoundingPolicy::Full), &options, &factors()).unwrap();

    assert!(outcome.report_file.is_none());
    assert!(outcome.diagnostics_file.exists());
}

#[test]
fn test_missing_workbook_is_workbook_error() {
    let temp_dir = TempDir::new().unwrap();
    let options = PipelineOptions {
        workbook: temp_dir.path().join("absent.xlsx"),
        output_dir: temp_dir.path().join("output"),
        docs_dir: None,
        rounding: RoundingPolicy::Full,
    };

    let result = ecal_ns::run(&options);

    assert!(matches!(result, Err(Error::Workbook(_))));
    assert!(!options.output_dir.exists());
}
