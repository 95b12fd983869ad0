//! In-memory table of extracted records.
//!
//! A [`Table`] is built by folding per-document record batches together and is
//! then reshaped by value: every operation consumes the table and returns a new
//! one, so nothing is mutated behind the caller's back.

use std::collections::{BTreeMap, HashSet};
use std::io;

use serde::Serialize;

use crate::extract::RepositoryRecord;
use crate::field_map::{ID_COLUMN, NAME_COLUMN};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("column '{0}' cannot be coerced")]
    ProtectedColumn(String),
}

/// Sort order for [`Table::sort_by`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Value conversions applied to a whole column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coercion {
    /// `"true"` when a value is present, `"false"` when null.
    Presence,
    /// Trims values, turns blanks into null, and records the category levels.
    Categorical,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<RepositoryRecord>,
    #[serde(skip)]
    categories: BTreeMap<String, Vec<String>>,
}

impl Table {
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            categories: BTreeMap::new(),
        }
    }

    /// Folds record batches into one table, preserving encounter order.
    pub fn assemble<I, B>(columns: Vec<String>, batches: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: IntoIterator<Item = RepositoryRecord>,
    {
        batches
            .into_iter()
            .fold(Self::empty(columns), |table, batch| table.append(batch))
    }

    /// Returns this table with `batch` appended.
    pub fn append<B: IntoIterator<Item = RepositoryRecord>>(mut self, batch: B) -> Self {
        self.rows.extend(batch);
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[RepositoryRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RepositoryRecord> {
        self.rows.iter()
    }

    /// Keeps the first `n` rows.
    pub fn head(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    fn check_column(&self, column: &str) -> Result<(), TableError> {
        if self.columns.iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(TableError::UnknownColumn(column.to_string()))
        }
    }

    pub fn column_values(&self, column: &str) -> Result<Vec<Option<&str>>, TableError> {
        self.check_column(column)?;
        Ok(self.rows.iter().map(|row| row.get(column)).collect())
    }

    /// Keeps the first row for each distinct key tuple. Idempotent.
    pub fn dedup_by(mut self, key: &[&str]) -> Result<Self, TableError> {
        for column in key {
            self.check_column(column)?;
        }
        let mut seen: HashSet<Vec<Option<String>>> = HashSet::new();
        self.rows.retain(|row| {
            let tuple = key
                .iter()
                .map(|column| row.get(column).map(str::to_string))
                .collect();
            seen.insert(tuple)
        });
        Ok(self)
    }

    pub fn coerce(mut self, column: &str, coercion: Coercion) -> Result<Self, TableError> {
        self.check_column(column)?;
        if column == ID_COLUMN || column == NAME_COLUMN {
            return Err(TableError::ProtectedColumn(column.to_string()));
        }
        match coercion {
            Coercion::Presence => {
                for row in &mut self.rows {
                    let present = row.get(column).is_some();
                    row.set(column, Some(present.to_string()));
                }
            }
            Coercion::Categorical => {
                let mut levels: Vec<String> = Vec::new();
                for row in &mut self.rows {
                    let value = row
                        .get(column)
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string);
                    if let Some(level) = &value {
                        if !levels.contains(level) {
                            levels.push(level.clone());
                        }
                    }
                    row.set(column, value);
                }
                self.categories.insert(column.to_string(), levels);
            }
        }
        Ok(self)
    }

    /// Category levels recorded by [`Coercion::Categorical`], in first-seen order.
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.categories.get(column).map(Vec::as_slice)
    }

    /// Stable sort by one column using ordinal, case-sensitive comparison.
    /// Nulls come first when ascending and last when descending.
    pub fn sort_by(mut self, column: &str, direction: SortDirection) -> Result<Self, TableError> {
        self.check_column(column)?;
        self.rows.sort_by(|a, b| {
            let ordering = a.get(column).cmp(&b.get(column));
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        Ok(self)
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RepositoryRecord) -> bool,
    {
        self.rows.retain(|row| predicate(row));
        self
    }

    /// Drops rows where `column` is null.
    pub fn retain_present(self, column: &str) -> Result<Self, TableError> {
        self.check_column(column)?;
        Ok(self.filter(|row| row.get(column).is_some()))
    }

    /// Cells as strings in column order, nulls rendered empty.
    pub fn string_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| row.get(column).unwrap_or_default().to_string())
                    .collect()
            })
            .collect()
    }

    /// Writes the table as CSV with a header row.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in self.string_rows() {
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a RepositoryRecord;
    type IntoIter = std::slice::Iter<'a, RepositoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
