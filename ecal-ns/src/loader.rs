//! Workbook loading
//!
//! Reads one sheet of an .xlsx/.xls/.ods workbook into a [`Table`]. Cells
//! arrive typed: numbers as `Number`, text as `Text`, empty/error cells as
//! `Missing`. Further parsing (comma decimals etc.) is left to the rules.

use crate::error::{Error, Result};
use crate::table::Table;
use crate::value::Value;
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An open workbook
pub struct Workbook {
    path: PathBuf,
    sheets: Sheets<BufReader<File>>,
}

impl Workbook {
    pub fn open(path: &Path) -> Result<Self> {
        let sheets = open_workbook_auto(path)
            .map_err(|e| Error::Workbook(format!("Failed to open {}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Workbook opened");
        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    /// Load `sheet`, taking column names from zero-based `header_row`
    pub fn load_sheet(&mut self, sheet: &str, header_row: usize) -> Result<Table> {
        let range = self.sheets.worksheet_range(sheet).map_err(|e| {
            Error::Workbook(format!(
                "Failed to read sheet '{}' from {}: {}",
                sheet,
                self.path.display(),
                e
            ))
        })?;
        let table = table_from_range(sheet, &range, header_row);
        info!(
            sheet,
            columns = table.columns().len(),
            records = table.len(),
            "Sheet loaded"
        );
        Ok(table)
    }
}

/// Convert a cell range into a table
///
/// `header_row` is counted from the top of the sheet, not from the first
/// non-empty row of `range`. Blank header cells are named `Unnamed: <col>`,
/// repeated names get `.1`, `.2`, ... suffixes, and fully blank data rows
/// are skipped.
pub fn table_from_range(name: &str, range: &Range<Data>, header_row: usize) -> Table {
    let (start_row, start_col) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));
    let width = range.width();
    let rows: Vec<&[Data]> = range.rows().collect();

    // Header row may lie above the range when it is blank in the sheet
    let (header, data): (Option<&[Data]>, &[&[Data]]) = if header_row < start_row {
        (None, &rows[..])
    } else {
        let offset = header_row - start_row;
        match rows.get(offset) {
            Some(cells) => (Some(*cells), &rows[offset + 1..]),
            None => (None, &[]),
        }
    };

    let columns = column_names(header, width, start_col);
    let mut table = Table::new(name, columns);
    let mut skipped = 0usize;

    for cells in data {
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            skipped += 1;
            continue;
        }
        table.push(cells.iter().map(cell_value).collect());
    }

    if skipped > 0 {
        debug!(sheet = name, skipped, "Blank rows skipped");
    }
    table
}

fn column_names(header: Option<&[Data]>, width: usize, start_col: usize) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    (0..width)
        .map(|i| {
            let raw = match header.and_then(|h| h.get(i)).map(cell_value) {
                Some(Value::Missing) | None => format!("Unnamed: {}", start_col + i),
                Some(value) => value.to_string(),
            };
            let count = seen.entry(raw.clone()).or_insert(0);
            let name = if *count == 0 {
                raw
            } else {
                format!("{}.{}", raw, count)
            };
            *count += 1;
            name
        })
        .collect()
}

/// Map one workbook cell to a value
pub fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::number(*i as f64),
        Data::Float(f) => Value::number(*f),
        Data::String(s) if s.is_empty() => Value::Missing,
        Data::String(s) => Value::Text(s.clone()),
        Data::Bool(b) => Value::Text(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) if ts.time() == chrono::NaiveTime::MIN => {
                Value::Text(ts.format("%Y-%m-%d").to_string())
            }
            Some(ts) => Value::Text(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Value::number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(_) | Data::Empty => Value::Missing,
    }
}
