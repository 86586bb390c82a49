//! ecal-ns - Normalize & Score
//!
//! Reads the activity workbook, cleans each sheet with its own rule list,
//! computes CO2e from a fixed emission factor table, validates the result
//! and writes one CSV per sheet plus a diagnostics summary and a report.

pub mod cleaning;
pub mod error;
pub mod factors;
pub mod loader;
pub mod pipeline;
pub mod scoring;
pub mod sinks;
pub mod sources;
pub mod table;
pub mod validator;
pub mod value;

pub use error::{Error, Result};
pub use factors::EmissionFactorTable;
pub use pipeline::{run, PipelineOptions, RunOutcome};
pub use scoring::RoundingPolicy;
pub use table::{Record, Table};
pub use validator::ValidationReport;
pub use value::Value;
