//! CO2e scoring: quantity × emission factor
//!
//! Total over the record set: a record whose factor ID does not resolve, or
//! whose quantity is not numeric, gets a missing score and processing
//! continues.

use crate::error::Result;
use crate::factors::EmissionFactorTable;
use crate::table::Table;
use crate::value::Value;
use serde::Serialize;
use tracing::{debug, info};

/// Rounding applied to computed scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RoundingPolicy {
    /// Keep full precision
    #[default]
    Full,
    /// Round half-to-even at this many decimal places
    Decimals(u32),
}

impl RoundingPolicy {
    pub fn from_decimals(decimals: Option<u32>) -> Self {
        decimals.map_or(RoundingPolicy::Full, RoundingPolicy::Decimals)
    }

    pub fn apply(&self, x: f64) -> f64 {
        match *self {
            RoundingPolicy::Full => x,
            // Beyond 15 places an f64 has no digits left to round
            RoundingPolicy::Decimals(n) if n > 15 => x,
            RoundingPolicy::Decimals(n) => {
                let scale = 10f64.powi(n as i32);
                let scaled = x * scale;
                // Values too large to scale already have no fractional digits
                if !scaled.is_finite() {
                    return x;
                }
                scaled.round_ties_even() / scale
            }
        }
    }
}

/// Counts collected while scoring one table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoringReport {
    pub dataset: String,
    pub scored: usize,
    /// Factor ID missing or not in the factor table
    pub unresolved_keys: usize,
    /// Factor ID resolved but quantity missing or unparsable
    pub invalid_quantities: usize,
    /// Text cells in the quantity or key column that failed numeric coercion
    pub coercion_failures: usize,
}

/// Score one record
pub fn score(
    quantity: &Value,
    factor_key: &Value,
    factors: &EmissionFactorTable,
    rounding: RoundingPolicy,
) -> Value {
    let Some(multiplier) = factors.resolve_value(&factor_key.coerce_number()) else {
        return Value::Missing;
    };
    match quantity.coerce_number() {
        Value::Number(q) => Value::number(rounding.apply(q * multiplier)),
        _ => Value::Missing,
    }
}

/// Names of the columns scoring reads and writes
#[derive(Debug, Clone, Copy)]
pub struct ScoreColumns<'a> {
    pub quantity: &'a str,
    pub factor_key: &'a str,
    pub score: &'a str,
}

/// Coerce the quantity and factor-key columns to numbers in place, then
/// write the score column (appended if absent)
pub fn score_table(
    table: &mut Table,
    columns: ScoreColumns<'_>,
    factors: &EmissionFactorTable,
    rounding: RoundingPolicy,
) -> Result<ScoringReport> {
    let q = table.column_index(columns.quantity)?;
    let k = table.column_index(columns.factor_key)?;
    let s = table.ensure_column(columns.score);

    let mut report = ScoringReport {
        dataset: table.name().to_string(),
        ..Default::default()
    };

    for (row, record) in table.records_mut().iter_mut().enumerate() {
        for index in [q, k] {
            let original = record.get(index);
            let coerced = original.coerce_number();
            if coerced.is_missing() && !original.is_missing() {
                debug!(row, value = %original, "Numeric coercion failed");
                report.coercion_failures += 1;
            }
            record.set(index, coerced);
        }

        let value = score(record.get(q), record.get(k), factors, rounding);
        if value.is_missing() {
            if factors.resolve_value(record.get(k)).is_none() {
                report.unresolved_keys += 1;
            } else {
                report.invalid_quantities += 1;
            }
        } else {
            report.scored += 1;
        }
        record.set(s, value);
    }

    info!(
        dataset = %report.dataset,
        scored = report.scored,
        unresolved_keys = report.unresolved_keys,
        invalid_quantities = report.invalid_quantities,
        "Scoring complete"
    );

    Ok(report)
}
