//! Named tables of records

use crate::error::{Error, Result};
use crate::value::{CellKey, Value};

/// One row, aligned with its table's column list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Cell at `index`; out-of-range reads as missing
    pub fn get(&self, index: usize) -> &Value {
        static MISSING: Value = Value::Missing;
        self.values.get(index).unwrap_or(&MISSING)
    }

    /// Overwrite the cell at `index`, growing the row if needed
    pub fn set(&mut self, index: usize, value: Value) {
        if index >= self.values.len() {
            self.values.resize(index + 1, Value::Missing);
        }
        self.values[index] = value;
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Identity of the full row for duplicate detection
    pub fn key(&self) -> Vec<CellKey> {
        self.values.iter().map(Value::key).collect()
    }
}

/// A dataset: one sheet or one CSV output
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            records: Vec::new(),
        }
    }

    /// Build a table from raw rows; rows are padded or truncated to the
    /// column count
    pub fn from_rows(
        name: impl Into<String>,
        columns: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> Self {
        let mut table = Self::new(name, columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push(row);
        }
        table
    }

    pub fn push(&mut self, mut values: Vec<Value>) {
        values.resize(self.columns.len(), Value::Missing);
        self.records.push(Record::new(values));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn set_records(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| Error::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Index of `column`, appending it (filled with `Missing`) if absent
    pub fn ensure_column(&mut self, column: &str) -> usize {
        if let Some(index) = self.columns.iter().position(|c| c == column) {
            return index;
        }
        self.columns.push(column.to_string());
        let index = self.columns.len() - 1;
        for record in &mut self.records {
            record.set(index, Value::Missing);
        }
        index
    }

    /// All cells of one column, in record order
    pub fn column(&self, column: &str) -> Result<Vec<&Value>> {
        let index = self.column_index(column)?;
        Ok(self.records.iter().map(|r| r.get(index)).collect())
    }
}
