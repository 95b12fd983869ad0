//! Aggregation helpers for harvested tables.
//!
//! All functions operate on a [`Table`] and return standard collections. They
//! do not perform network calls.

use std::collections::{HashMap, HashSet};

use crate::field_map::ID_COLUMN;
use crate::table::{Table, TableError};

/// Counts rows per value of `column`, skipping nulls.
///
/// Sorted by count descending, then value ascending. When the column was
/// coerced as categorical, every level is reported, including levels with no
/// remaining rows.
pub fn count_by(table: &Table, column: &str) -> Result<Vec<(String, usize)>, TableError> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    if let Some(levels) = table.categories(column) {
        for level in levels {
            counts.insert(level.clone(), 0);
        }
    }
    for value in table.column_values(column)?.into_iter().flatten() {
        *counts.entry(value.to_string()).or_default() += 1;
    }
    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(sorted)
}

/// Like [`count_by`], but each repository counts at most once per value.
pub fn count_per_repository(
    table: &Table,
    column: &str,
) -> Result<Vec<(String, usize)>, TableError> {
    let deduped = table.clone().dedup_by(&[ID_COLUMN, column])?;
    count_by(&deduped, column)
}

/// Number of distinct repository IDs in the table.
pub fn distinct_repositories(table: &Table) -> usize {
    table
        .iter()
        .map(|row| row.id.as_str())
        .collect::<HashSet<_>>()
        .len()
}
