//! Per-source cleaning rules
//!
//! Each source carries a fixed, ordered list of [`CleaningRule`]s. Rules are
//! applied once, in order, to the whole table; most of them touch one record
//! at a time, outlier substitution looks at a subset of records.
//!
//! # Rules
//! 1. **PatchFactorKey**: repair sentinel factor IDs using a name search in
//!    the reference table
//! 2. **ConvertUnit**: large unit → small unit, quantity scaled
//! 3. **NormalizeDecimal**: `,` decimal separator → `.`, then parse
//! 4. **RemapCategory**: derive factor ID from a categorical column
//! 5. **CoerceUnit**: force every unit to the canonical one
//! 6. **FillWhenStatus**: fill a missing value only when status matches
//! 7. **SubstituteOutlier**: replace a sentinel quantity with the subset mean

use crate::error::{Error, Result};
use crate::factors::{lookup_reference_id, FactorId};
use crate::table::Table;
use crate::value::Value;
use serde::Serialize;
use tracing::{debug, info};

/// Counts collected while cleaning one source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub dataset: String,
    pub keys_patched: usize,
    pub units_converted: usize,
    /// Text quantities that failed numeric parsing and became missing
    pub parse_failures: usize,
    pub unmapped_categories: usize,
    pub units_coerced: usize,
    pub values_filled: usize,
    pub outliers_replaced: usize,
}

/// Data the rules may read but never modify
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Reference sheet (emission factor names and IDs)
    pub reference: &'a Table,
}

/// One cleaning step
#[derive(Debug, Clone, Copy)]
pub enum CleaningRule {
    PatchFactorKey {
        /// Descriptive column searched for `match_needle`
        match_column: &'static str,
        match_needle: &'static str,
        key_column: &'static str,
        /// Marker meaning "ID unknown"
        sentinel: &'static str,
        reference_name_column: &'static str,
        reference_id_column: &'static str,
        reference_needle: &'static str,
    },
    ConvertUnit {
        quantity_column: &'static str,
        unit_column: &'static str,
        from_unit: &'static str,
        to_unit: &'static str,
        factor: f64,
    },
    NormalizeDecimal {
        column: &'static str,
    },
    RemapCategory {
        source_column: &'static str,
        target_column: &'static str,
        mapping: &'static [(&'static str, FactorId)],
    },
    CoerceUnit {
        column: &'static str,
        canonical: &'static str,
    },
    FillWhenStatus {
        column: &'static str,
        status_column: &'static str,
        status: &'static str,
        fill: f64,
    },
    SubstituteOutlier {
        /// Exact-match (column, text) filters selecting the subset
        subset: &'static [(&'static str, &'static str)],
        column: &'static str,
        sentinel: f64,
    },
}

impl CleaningRule {
    pub fn name(&self) -> &'static str {
        match self {
            CleaningRule::PatchFactorKey { .. } => "patch-factor-key",
            CleaningRule::ConvertUnit { .. } => "convert-unit",
            CleaningRule::NormalizeDecimal { .. } => "normalize-decimal",
            CleaningRule::RemapCategory { .. } => "remap-category",
            CleaningRule::CoerceUnit { .. } => "coerce-unit",
            CleaningRule::FillWhenStatus { .. } => "fill-when-status",
            CleaningRule::SubstituteOutlier { .. } => "substitute-outlier",
        }
    }

    /// Apply this rule to every record of `table`
    pub fn apply(
        &self,
        table: &mut Table,
        ctx: &RuleContext<'_>,
        report: &mut CleaningReport,
    ) -> Result<()> {
        match *self {
            CleaningRule::PatchFactorKey {
                match_column,
                match_needle,
                key_column,
                sentinel,
                reference_name_column,
                reference_id_column,
                reference_needle,
            } => {
                let replacement = lookup_reference_id(
                    ctx.reference,
                    reference_name_column,
                    reference_id_column,
                    reference_needle,
                )?;
                debug!(id = %replacement, needle = reference_needle, "Reference factor ID found");

                let m = table.column_index(match_column)?;
                let k = table.column_index(key_column)?;
                for record in table.records_mut() {
                    if record.get(m).contains_ignore_case(match_needle)
                        && record.get(k).is_text(sentinel)
                    {
                        record.set(k, replacement.clone());
                        report.keys_patched += 1;
                    }
                }
            }

            CleaningRule::ConvertUnit {
                quantity_column,
                unit_column,
                from_unit,
                to_unit,
                factor,
            } => {
                let q = table.column_index(quantity_column)?;
                let u = table.column_index(unit_column)?;
                for record in table.records_mut() {
                    let original = record.get(q).clone();
                    if let Some((quantity, unit)) =
                        convert_unit(&original, record.get(u), from_unit, to_unit, factor)
                    {
                        if quantity.is_missing() && !original.is_missing() {
                            debug!(value = %original, "Unparsable quantity in unit conversion");
                            report.parse_failures += 1;
                        }
                        record.set(q, quantity);
                        record.set(u, unit);
                        report.units_converted += 1;
                    }
                }
            }

            CleaningRule::NormalizeDecimal { column } => {
                let q = table.column_index(column)?;
                for record in table.records_mut() {
                    let original = record.get(q);
                    let parsed = original.parse_decimal_comma();
                    if parsed.is_missing() && !original.is_missing() {
                        debug!(value = %original, "Unparsable quantity set to missing");
                        report.parse_failures += 1;
                    }
                    record.set(q, parsed);
                }
            }

            CleaningRule::RemapCategory {
                source_column,
                target_column,
                mapping,
            } => {
                let s = table.column_index(source_column)?;
                let t = table.ensure_column(target_column);
                for record in table.records_mut() {
                    let key = remap_category(record.get(s), mapping);
                    if key.is_missing() {
                        report.unmapped_categories += 1;
                    }
                    record.set(t, key);
                }
            }

            CleaningRule::CoerceUnit { column, canonical } => {
                let u = table.column_index(column)?;
                for record in table.records_mut() {
                    if let Some(unit) = coerce_unit(record.get(u), canonical) {
                        record.set(u, unit);
                        report.units_coerced += 1;
                    }
                }
            }

            CleaningRule::FillWhenStatus {
                column,
                status_column,
                status,
                fill,
            } => {
                let c = table.column_index(column)?;
                let s = table.column_index(status_column)?;
                for record in table.records_mut() {
                    if record.get(s).is_text(status) && record.get(c).is_missing() {
                        record.set(c, Value::number(fill));
                        report.values_filled += 1;
                    }
                }
            }

            CleaningRule::SubstituteOutlier {
                subset,
                column,
                sentinel,
            } => {
                report.outliers_replaced += substitute_outlier(table, subset, column, sentinel)?;
            }
        }
        Ok(())
    }
}

/// Run a source's rules in order
pub fn apply_rules(
    table: &mut Table,
    rules: &[CleaningRule],
    ctx: &RuleContext<'_>,
) -> Result<CleaningReport> {
    let mut report = CleaningReport {
        dataset: table.name().to_string(),
        ..Default::default()
    };

    for rule in rules {
        rule.apply(table, ctx, &mut report)?;
        debug!(dataset = %table.name(), rule = rule.name(), "Rule applied");
    }

    info!(
        dataset = %report.dataset,
        keys_patched = report.keys_patched,
        units_converted = report.units_converted,
        parse_failures = report.parse_failures,
        unmapped = report.unmapped_categories,
        units_coerced = report.units_coerced,
        filled = report.values_filled,
        outliers = report.outliers_replaced,
        "Cleaning complete"
    );

    Ok(report)
}

/// Unit conversion for one record
///
/// Returns the new (quantity, unit) pair when `unit` is the large unit,
/// `None` otherwise. A quantity that cannot be parsed becomes missing.
pub fn convert_unit(
    quantity: &Value,
    unit: &Value,
    from_unit: &str,
    to_unit: &str,
    factor: f64,
) -> Option<(Value, Value)> {
    if !unit.is_text(from_unit) {
        return None;
    }
    let scaled = match quantity.parse_decimal_comma() {
        Value::Number(x) => Value::number(x * factor),
        _ => Value::Missing,
    };
    Some((scaled, Value::text(to_unit)))
}

/// Factor ID for a category; unmapped or non-text categories are missing
pub fn remap_category(category: &Value, mapping: &[(&str, FactorId)]) -> Value {
    category
        .as_text()
        .and_then(|c| mapping.iter().find(|(name, _)| *name == c))
        .map(|(_, id)| Value::Number(*id as f64))
        .unwrap_or(Value::Missing)
}

/// Canonical unit when `unit` differs from it (missing included)
pub fn coerce_unit(unit: &Value, canonical: &str) -> Option<Value> {
    if unit.is_text(canonical) {
        None
    } else {
        Some(Value::text(canonical))
    }
}

/// Mean of the subset's quantities, excluding sentinel and missing cells
pub fn outlier_mean<'a>(
    quantities: impl IntoIterator<Item = &'a Value>,
    sentinel: f64,
) -> Option<f64> {
    let (sum, count) = quantities
        .into_iter()
        .filter_map(Value::as_number)
        .filter(|x| *x != sentinel)
        .fold((0.0, 0usize), |(sum, count), x| (sum + x, count + 1));

    (count > 0).then(|| sum / count as f64)
}

fn describe_subset(subset: &[(&str, &str)]) -> String {
    subset
        .iter()
        .map(|(column, value)| format!("{}={}", column, value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Replace sentinel quantities in the subset with the mean of the others
///
/// Returns the number of replaced cells. A subset without sentinel values
/// is left untouched.
fn substitute_outlier(
    table: &mut Table,
    subset: &[(&str, &str)],
    column: &str,
    sentinel: f64,
) -> Result<usize> {
    let filters = subset
        .iter()
        .map(|(c, v)| table.column_index(c).map(|i| (i, *v)))
        .collect::<Result<Vec<_>>>()?;
    let q = table.column_index(column)?;

    let members: Vec<usize> = table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| filters.iter().all(|(i, v)| r.get(*i).is_text(v)))
        .map(|(index, _)| index)
        .collect();

    let outliers: Vec<usize> = members
        .iter()
        .copied()
        .filter(|i| table.records()[*i].get(q).as_number() == Some(sentinel))
        .collect();
    if outliers.is_empty() {
        return Ok(0);
    }

    let mean = outlier_mean(members.iter().map(|i| table.records()[*i].get(q)), sentinel)
        .ok_or_else(|| Error::UndefinedMean {
            subset: describe_subset(subset),
        })?;

    info!(
        subset = %describe_subset(subset),
        members = members.len(),
        outliers = outliers.len(),
        mean,
        "Replacing outlier quantities with subset mean"
    );

    let records = table.records_mut();
    for i in &outliers {
        records[*i].set(q, Value::number(mean));
    }
    Ok(outliers.len())
}
