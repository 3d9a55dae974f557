//! Consumed capacity aggregation
//!
//! Folds the `ConsumedCapacity` records of several physical calls into one
//! record per table. Every numeric field is summed independently; a field or
//! secondary index is present in the result if any input carried it, with
//! absent values counted as zero.

use aws_sdk_dynamodb::types::{Capacity, ConsumedCapacity};
use std::collections::HashMap;

/// Merge capacity records into one
///
/// Returns `None` for an empty input, so a logical result can tell "no
/// capacity reported" apart from a zero cost. The table name of the first
/// record is kept.
pub fn aggregate(records: &[ConsumedCapacity]) -> Option<ConsumedCapacity> {
    let (first, rest) = records.split_first()?;

    if rest.iter().any(|r| r.table_name != first.table_name) {
        tracing::warn!(
            table_name = ?first.table_name,
            "aggregating consumed capacity across different tables"
        );
    }

    let merged = rest.iter().fold(first.clone(), |total, record| {
        ConsumedCapacity::builder()
            .set_table_name(total.table_name)
            .set_capacity_units(add(total.capacity_units, record.capacity_units))
            .set_read_capacity_units(add(total.read_capacity_units, record.read_capacity_units))
            .set_write_capacity_units(add(total.write_capacity_units, record.write_capacity_units))
            .set_table(add_capacity(total.table, record.table.as_ref()))
            .set_local_secondary_indexes(add_indexes(
                total.local_secondary_indexes,
                record.local_secondary_indexes.as_ref(),
            ))
            .set_global_secondary_indexes(add_indexes(
                total.global_secondary_indexes,
                record.global_secondary_indexes.as_ref(),
            ))
            .build()
    });

    Some(merged)
}

/// Merge capacity records per table, in order of first appearance
pub fn aggregate_multiple(records: &[ConsumedCapacity]) -> Vec<ConsumedCapacity> {
    let mut by_table: Vec<(Option<&str>, Vec<ConsumedCapacity>)> = Vec::new();

    for record in records {
        let table_name = record.table_name.as_deref();
        match by_table.iter_mut().find(|(name, _)| *name == table_name) {
            Some((_, group)) => group.push(record.clone()),
            None => by_table.push((table_name, vec![record.clone()])),
        }
    }

    by_table
        .into_iter()
        .filter_map(|(_, group)| aggregate(&group))
        .collect()
}

fn add(total: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (total, value) {
        (None, None) => None,
        (total, value) => Some(total.unwrap_or_default() + value.unwrap_or_default()),
    }
}

fn add_capacity(total: Option<Capacity>, value: Option<&Capacity>) -> Option<Capacity> {
    let value = match value {
        Some(value) => value,
        None => return total,
    };

    let total = total.unwrap_or_else(|| Capacity::builder().build());
    Some(
        Capacity::builder()
            .set_capacity_units(add(total.capacity_units, value.capacity_units))
            .set_read_capacity_units(add(total.read_capacity_units, value.read_capacity_units))
            .set_write_capacity_units(add(total.write_capacity_units, value.write_capacity_units))
            .build(),
    )
}

fn add_indexes(
    total: Option<HashMap<String, Capacity>>,
    value: Option<&HashMap<String, Capacity>>,
) -> Option<HashMap<String, Capacity>> {
    let value = match value {
        Some(value) => value,
        None => return total,
    };

    let mut total = total.unwrap_or_default();
    for (index_name, capacity) in value {
        let merged = add_capacity(total.remove(index_name), Some(capacity));
        if let Some(merged) = merged {
            let _ = total.insert(index_name.clone(), merged);
        }
    }

    Some(total)
}
