//! CSV output

use crate::error::Result;
use crate::table::Table;
use std::path::Path;
use tracing::info;

/// Write `table` with a header row, one record per line, columns in table
/// order; missing cells are written as empty fields
pub fn write_table_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.columns())?;
    for record in table.records() {
        writer.write_record(record.values().iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;

    info!(
        dataset = table.name(),
        records = table.len(),
        path = %path.display(),
        "CSV written"
    );
    Ok(())
}
