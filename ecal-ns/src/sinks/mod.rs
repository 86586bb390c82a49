//! Output collaborators
//!
//! # Sinks
//! 1. **csv_sink** - one cleaned CSV per dataset
//! 2. **diagnostics** - machine-readable JSON summary of every report
//! 3. **report** - narrative README.md describing the run

pub mod csv_sink;
pub mod diagnostics;
pub mod report;

pub use csv_sink::write_table_csv;
pub use diagnostics::{write_diagnostics, DatasetDiagnostics, RunDiagnostics};
pub use report::{render_report, write_report};
