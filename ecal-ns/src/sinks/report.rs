//! Narrative Markdown report
//!
//! Fixed structure describing the steps of a run. The only data-driven
//! parts are the factor list, per-dataset counts and the output file names.

use super::diagnostics::RunDiagnostics;
use crate::error::Result;
use crate::factors::EmissionFactorTable;
use crate::scoring::RoundingPolicy;
use crate::sources::{ENERGY_OUTLIER, PROCUREMENT, REFERENCE_SHEET, SOURCES, TRAVEL};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Render the report text
pub fn render_report(diagnostics: &RunDiagnostics, factors: &EmissionFactorTable) -> Result<String> {
    let mut out = String::new();
    write_sections(&mut out, diagnostics, factors)?;
    Ok(out)
}

/// Render and write `README.md` into `docs_dir` (created if absent)
pub fn write_report(
    docs_dir: &Path,
    diagnostics: &RunDiagnostics,
    factors: &EmissionFactorTable,
) -> Result<PathBuf> {
    std::fs::create_dir_all(docs_dir)?;
    let path = docs_dir.join("README.md");
    std::fs::write(&path, render_report(diagnostics, factors)?)?;
    info!(path = %path.display(), "Report written");
    Ok(path)
}

fn write_sections(
    out: &mut String,
    diagnostics: &RunDiagnostics,
    factors: &EmissionFactorTable,
) -> std::fmt::Result {
    let workbook = diagnostics
        .workbook
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| diagnostics.workbook.display().to_string());

    writeln!(out, "# Data Cleaning and CO2e Calculation for Emission Data\n")?;
    writeln!(out, "## Project Overview")?;
    writeln!(
        out,
        "Activity data from {} sheets of `{}` ({}) is cleaned and transformed. \
         Emission factors are applied to calculate CO2e emissions for each record, \
         and each sheet is saved as a separate CSV file.\n",
        SOURCES.len(),
        workbook,
        sheet_list(),
    )?;

    writeln!(out, "## Steps Followed\n")?;

    writeln!(out, "### 1. Emission Factors Dictionary")?;
    writeln!(
        out,
        "A fixed table maps Emission Factor ID to its emission factor. \
         IDs absent from the table produce an empty CO2e value, never zero.\n"
    )?;
    writeln!(out, "| Emission Factor ID | Factor |")?;
    writeln!(out, "|---|---|")?;
    for (id, multiplier) in factors.entries() {
        writeln!(out, "| {} | {} |", id, multiplier)?;
    }
    writeln!(out)?;

    writeln!(out, "### 2. Load Excel Data")?;
    writeln!(out, "The following sheets are read from `{}`:", workbook)?;
    for source in SOURCES {
        writeln!(out, "- {}", source.sheet)?;
    }
    writeln!(out, "- {} (Emission Factors reference)\n", REFERENCE_SHEET)?;

    writeln!(out, "### 3. {} Data Cleaning", PROCUREMENT.sheet)?;
    writeln!(out, "#### a. Replace Missing Aluminium Emission Factor ID")?;
    writeln!(
        out,
        "The aluminium Emission Factor ID is looked up by name in the {} sheet and \
         written into aluminium rows whose ID is `-`. The run stops if the {} sheet \
         has no aluminium entry.\n",
        REFERENCE_SHEET, REFERENCE_SHEET
    )?;
    writeln!(out, "#### b. Convert Units")?;
    writeln!(out, "Values in tonnes (`t`) are converted to kilograms (`kg`) by multiplying them by 1000.\n")?;
    writeln!(out, "#### c. Clean Quantity Column")?;
    writeln!(
        out,
        "Commas are replaced with dots in the quantity column, which is then converted \
         to numbers. Values that still fail to parse are left empty.\n"
    )?;

    writeln!(out, "### 4. {} Data Cleaning", TRAVEL.sheet)?;
    writeln!(out, "#### a. Map Emission Factor ID Based on Transport Mode")?;
    writeln!(
        out,
        "The Emission Factor ID is derived from the transport mode (Air, Road, Train). \
         Other modes are left without an ID.\n"
    )?;
    writeln!(out, "#### b. Standardize Unit Column")?;
    writeln!(out, "All entries in the Unit column are set to `p.km`.\n")?;

    writeln!(out, "### 5. Energy Data Cleaning")?;
    writeln!(out, "#### a. Handle Missing Values")?;
    writeln!(out, "Missing `%missing` values are replaced with 0 for records whose Status is `Complete`.\n")?;
    writeln!(out, "#### b. Fix Units")?;
    writeln!(out, "All entries in the Unit column are set to `kWh`.\n")?;
    writeln!(out, "#### c. Replace Outliers")?;
    writeln!(
        out,
        "The outlier quantity {} is replaced with the average consumption of the other \
         records sharing its Country (France), Location (FR Offices) and Type (Gas).\n",
        ENERGY_OUTLIER
    )?;
    writeln!(
        out,
        "- **Country**: offices in the same country share consumption standards, \
         regulations and climate.\n\
         - **Location**: offices of the same company share infrastructure and usage habits.\n\
         - **Type**: gas and electricity follow different dynamics, so only gas records are averaged.\n"
    )?;

    writeln!(out, "### 6. Emission Factors Mapping and CO2e Calculation")?;
    let rounding = match diagnostics.rounding {
        RoundingPolicy::Full => "kept at full precision".to_string(),
        RoundingPolicy::Decimals(n) => format!("rounded to {} decimal places", n),
    };
    writeln!(
        out,
        "CO2e is the quantity multiplied by the factor of the record's Emission Factor ID, {}.\n",
        rounding
    )?;

    writeln!(out, "### 7. Data Validation")?;
    writeln!(out, "Each dataset is checked before saving:\n")?;
    writeln!(out, "| Dataset | Records | Duplicates removed | Missing cells | Negative cells |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for d in &diagnostics.datasets {
        let v = &d.validation;
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            v.dataset, v.records_out, v.duplicates_removed, v.missing_cells, v.negative_cells
        )?;
    }
    writeln!(out)?;
    writeln!(out, "#### a. Duplicate Rows")?;
    writeln!(
        out,
        "Identical rows are collapsed to their first occurrence ({} removed in total).\n",
        diagnostics.total_duplicates_removed()
    )?;
    writeln!(out, "#### b. Missing Values")?;
    writeln!(out, "Empty cells, notably in `Quantity`, `Emission Factor ID` and `CO2e`, are reported as warnings.\n")?;
    writeln!(out, "#### c. Negative Values")?;
    writeln!(out, "Negative numbers are reported as warnings; they are not valid emission quantities.\n")?;

    writeln!(out, "### 8. Save Cleaned Data to CSV")?;
    writeln!(out, "The cleaned and transformed datasets were saved as CSV files:")?;
    for d in &diagnostics.datasets {
        writeln!(out, "- {}", d.output_file)?;
    }
    writeln!(out)?;

    writeln!(out, "### 9. Completion")?;
    writeln!(
        out,
        "The CSV files were generated on {} and are ready for further analysis or reporting.",
        diagnostics.generated_at.format("%Y-%m-%d %H:%M UTC")
    )?;
    Ok(())
}

fn sheet_list() -> String {
    SOURCES
        .iter()
        .map(|s| s.sheet)
        .collect::<Vec<_>>()
        .join(", ")
}
