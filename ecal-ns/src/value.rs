//! Cell values
//!
//! Every cell is one of `Text`, `Number` or `Missing`. Rules match on the
//! variant explicitly; nothing is coerced implicitly. Non-finite numbers
//! are never stored: constructing one yields `Missing`.

use serde::Serialize;
use std::fmt;

/// A single spreadsheet cell
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    #[default]
    Missing,
}

/// Hashable identity of a value, used for duplicate detection
///
/// Numbers compare by bit pattern with `-0.0` folded into `0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellKey {
    Text(String),
    Number(u64),
    Missing,
}

impl Value {
    /// Finite number, or `Missing` for NaN/infinity
    pub fn number(x: f64) -> Self {
        if x.is_finite() {
            Value::Number(x)
        } else {
            Value::Missing
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Exact text equality; numbers and missing cells never match
    pub fn is_text(&self, expected: &str) -> bool {
        self.as_text() == Some(expected)
    }

    /// Case-insensitive substring test on text cells
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        match self {
            Value::Text(s) => s.to_lowercase().contains(&needle.to_lowercase()),
            _ => false,
        }
    }

    /// Numeric coercion: numbers pass through, text is parsed, failures
    /// become `Missing`
    pub fn coerce_number(&self) -> Value {
        match self {
            Value::Number(_) | Value::Missing => self.clone(),
            Value::Text(s) => parse_number(s),
        }
    }

    /// Like [`Value::coerce_number`], but text using `,` as decimal
    /// separator is rewritten to `.` before parsing
    pub fn parse_decimal_comma(&self) -> Value {
        match self {
            Value::Number(_) | Value::Missing => self.clone(),
            Value::Text(s) => parse_number(&s.replace(',', ".")),
        }
    }

    pub fn key(&self) -> CellKey {
        match self {
            Value::Text(s) => CellKey::Text(s.clone()),
            Value::Number(x) if *x == 0.0 => CellKey::Number(0.0f64.to_bits()),
            Value::Number(x) => CellKey::Number(x.to_bits()),
            Value::Missing => CellKey::Missing,
        }
    }
}

fn parse_number(raw: &str) -> Value {
    match raw.trim().parse::<f64>() {
        Ok(x) => Value::number(x),
        Err(_) => Value::Missing,
    }
}

/// CSV field rendering: missing cells are empty
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(x) => write!(f, "{}", x),
            Value::Missing => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::number(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}
