//! Group-and-sum over measurement records

use crate::client::Measurement;
use std::collections::HashMap;
use tracing::debug;

/// Sum `value_fn` per `key_fn` group, largest total first
///
/// Groups with equal totals keep the order in which they were first seen.
/// Records for which `key_fn` returns `None` are skipped.
pub fn aggregate<T, K, V>(records: &[T], mut key_fn: K, mut value_fn: V) -> Vec<(String, f64)>
where
    K: FnMut(&T) -> Option<String>,
    V: FnMut(&T) -> f64,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, f64)> = Vec::new();

    for record in records {
        let Some(key) = key_fn(record) else {
            continue;
        };
        let value = value_fn(record);
        match index.get(&key) {
            Some(&i) => buckets[i].1 += value,
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push((key, value));
            }
        }
    }

    // sort_by is stable
    buckets.sort_by(|a, b| b.1.total_cmp(&a.1));
    buckets
}

/// Per-group totals of a measurement set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupTotals {
    pub group_field: String,
    pub groups: Vec<(String, f64)>,
    /// Measurements without the grouping attribute
    pub skipped: usize,
    /// Grouped measurements with a negative `resultValue`
    pub negative_values: usize,
}

impl GroupTotals {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Sum `resultValue` per `group_field` attribute
pub fn totals_by_field(measurements: &[Measurement], group_field: &str) -> GroupTotals {
    let mut skipped = 0usize;
    let mut negative_values = 0usize;
    let groups = aggregate(
        measurements,
        |m| {
            let key = m.group_key(group_field);
            if key.is_none() {
                skipped += 1;
                debug!(group_field, value = m.result_value, "Measurement without group skipped");
            }
            key
        },
        |m| {
            if m.result_value < 0.0 {
                negative_values += 1;
                debug!(group_field, value = m.result_value, "Negative measurement");
            }
            m.result_value
        },
    );

    GroupTotals {
        group_field: group_field.to_string(),
        groups,
        skipped,
        negative_values,
    }
}
