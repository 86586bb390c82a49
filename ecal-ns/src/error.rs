//! Error types for ecal-ns
//!
//! Structural failures abort the pipeline. Per-cell parse failures are not
//! errors: they become `Value::Missing` and are counted in the reports.

use thiserror::Error;

/// Main error type for the Normalize & Score pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Required reference row could not be found by name
    #[error("Missing reference: no row in '{reference}' has a name containing '{needle}'")]
    MissingReference { needle: String, reference: String },

    /// Outlier substitution subset has nothing to average
    #[error("Undefined mean: no valid quantities left to average in subset [{subset}]")]
    UndefinedMean { subset: String },

    /// Table lacks a column a rule needs
    #[error("Column '{column}' not found in '{table}'")]
    MissingColumn { table: String, column: String },

    /// Emission factor table construction rejected its input
    #[error("Invalid emission factor table: {0}")]
    InvalidFactorTable(String),

    /// Workbook could not be opened or a sheet could not be read
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// CSV writer errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Diagnostics serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Report text formatting errors
    #[error("Report formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ecal-common error
    #[error(transparent)]
    Common(#[from] ecal_common::Error),
}

/// Convenience Result type using ecal-ns Error
pub type Result<T> = std::result::Result<T, Error>;
