//! Emission factor lookup
//!
//! An immutable map from integer factor ID to a positive multiplier, plus the
//! reference-sheet search used to repair sentinel factor IDs by name.

use crate::error::{Error, Result};
use crate::table::Table;
use crate::value::Value;
use std::collections::HashMap;

/// Integer emission factor identifier
pub type FactorId = u64;

/// Built-in emission factors (kg CO2e per unit of quantity)
pub const BUILTIN_FACTORS: [(FactorId, f64); 10] = [
    (259795, 1700.0),
    (6553911, 0.137567911),
    (6281066, 1.07412),
    (6281843, 0.656101),
    (6626527, 0.78669561),
    (262740, 0.305),
    (5418889, 0.149),
    (5424149, 0.00592),
    (262477, 0.406),
    (3360917, 0.18387),
];

/// Read-only factor table
#[derive(Debug, Clone)]
pub struct EmissionFactorTable {
    factors: HashMap<FactorId, f64>,
}

impl EmissionFactorTable {
    /// Build from (id, multiplier) pairs
    ///
    /// Rejects duplicate IDs and multipliers that are not finite and positive.
    pub fn new(pairs: impl IntoIterator<Item = (FactorId, f64)>) -> Result<Self> {
        let mut factors = HashMap::new();
        for (id, multiplier) in pairs {
            if !multiplier.is_finite() || multiplier <= 0.0 {
                return Err(Error::InvalidFactorTable(format!(
                    "factor {} has non-positive multiplier {}",
                    id, multiplier
                )));
            }
            if factors.insert(id, multiplier).is_some() {
                return Err(Error::InvalidFactorTable(format!(
                    "factor {} listed twice",
                    id
                )));
            }
        }
        Ok(Self { factors })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(BUILTIN_FACTORS)
    }

    pub fn resolve(&self, id: FactorId) -> Option<f64> {
        self.factors.get(&id).copied()
    }

    /// Resolve a factor-key cell; only integral non-negative numbers qualify
    pub fn resolve_value(&self, key: &Value) -> Option<f64> {
        factor_id(key).and_then(|id| self.resolve(id))
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Factors sorted by ID, for reporting
    pub fn entries(&self) -> Vec<(FactorId, f64)> {
        let mut entries: Vec<_> = self.factors.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }
}

/// Interpret a cell as a factor ID
pub fn factor_id(key: &Value) -> Option<FactorId> {
    // Largest integer an f64 holds exactly
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    match key {
        Value::Number(x) if *x >= 0.0 && x.fract() == 0.0 && *x <= MAX_EXACT => {
            Some(*x as FactorId)
        }
        _ => None,
    }
}

/// Find the factor ID of the first reference row whose name contains
/// `needle` (case-insensitive)
///
/// Fails with `MissingReference` when no row matches or the matching row
/// carries no ID.
pub fn lookup_reference_id(
    reference: &Table,
    name_column: &str,
    id_column: &str,
    needle: &str,
) -> Result<Value> {
    let name_index = reference.column_index(name_column)?;
    let id_index = reference.column_index(id_column)?;

    reference
        .records()
        .iter()
        .find(|record| record.get(name_index).contains_ignore_case(needle))
        .map(|record| record.get(id_index).clone())
        .filter(|id| !id.is_missing())
        .ok_or_else(|| Error::MissingReference {
            needle: needle.to_string(),
            reference: reference.name().to_string(),
        })
}
