//! Workbook sheets and their cleaning rule lists

use crate::cleaning::CleaningRule;
use crate::factors::FactorId;

/// Column holding the factor ID in every scored sheet
pub const FACTOR_KEY_COLUMN: &str = "Emission Factor ID";
/// Derived score column appended to every scored sheet
pub const SCORE_COLUMN: &str = "CO2e";

/// Reference sheet listing emission factor names and IDs
pub const REFERENCE_SHEET: &str = "EF";
pub const REFERENCE_HEADER_ROW: usize = 0;
pub const REFERENCE_NAME_COLUMN: &str = "Emission Factor Name";

/// Quantity that is known to be a data-entry error in the energy sheet
pub const ENERGY_OUTLIER: f64 = 105_560_000_000_000_000.0;

/// Transport mode → factor ID
pub const TRANSPORT_FACTORS: &[(&str, FactorId)] = &[
    ("Air", 262740),
    ("Road", 5418889),
    ("Train", 5424149),
];

/// One scored sheet of the input workbook
#[derive(Debug, Clone, Copy)]
pub struct SourceSpec {
    /// Short identifier used in logs
    pub id: &'static str,
    pub sheet: &'static str,
    /// Zero-based row holding the column names
    pub header_row: usize,
    pub quantity_column: &'static str,
    /// CSV file name written to the output directory
    pub output_file: &'static str,
    pub rules: &'static [CleaningRule],
}

pub const PROCUREMENT: SourceSpec = SourceSpec {
    id: "procurement",
    sheet: "Procurement Castel",
    header_row: 0,
    quantity_column: "Quantity in kg",
    output_file: "Procurement Castel_Cleaned.csv",
    rules: &[
        CleaningRule::PatchFactorKey {
            match_column: "Material",
            match_needle: "Aluminium",
            key_column: FACTOR_KEY_COLUMN,
            sentinel: "-",
            reference_name_column: REFERENCE_NAME_COLUMN,
            reference_id_column: FACTOR_KEY_COLUMN,
            reference_needle: "aluminum",
        },
        CleaningRule::ConvertUnit {
            quantity_column: "Quantity in kg",
            unit_column: "Unit",
            from_unit: "t",
            to_unit: "kg",
            factor: 1000.0,
        },
        CleaningRule::NormalizeDecimal {
            column: "Quantity in kg",
        },
    ],
};

pub const TRAVEL: SourceSpec = SourceSpec {
    id: "travel",
    sheet: "CONCUR 2023 Cars Inc",
    header_row: 1,
    quantity_column: "Quantity",
    output_file: "CONCUR 2023 Cars Inc_Cleaned.csv",
    rules: &[
        CleaningRule::RemapCategory {
            source_column: "Transport",
            target_column: FACTOR_KEY_COLUMN,
            mapping: TRANSPORT_FACTORS,
        },
        CleaningRule::CoerceUnit {
            column: "Unit",
            canonical: "p.km",
        },
    ],
};

pub const ENERGY: SourceSpec = SourceSpec {
    id: "energy",
    sheet: "Energy data",
    header_row: 1,
    quantity_column: "Quantity",
    output_file: "Energy data_cleaned.csv",
    rules: &[
        CleaningRule::FillWhenStatus {
            column: "%missing",
            status_column: "Status",
            status: "Complete",
            fill: 0.0,
        },
        CleaningRule::CoerceUnit {
            column: "Unit",
            canonical: "kWh",
        },
        CleaningRule::SubstituteOutlier {
            subset: &[
                ("Country", "France"),
                ("Location", "FR Offices"),
                ("Type", "Gas"),
            ],
            column: "Quantity",
            sentinel: ENERGY_OUTLIER,
        },
    ],
};

/// Scored sheets in processing order
pub const SOURCES: [SourceSpec; 3] = [PROCUREMENT, TRAVEL, ENERGY];
