//! Record extraction: one repository document in, one or more flat rows out.
//!
//! Every field in the [`FieldMap`] is evaluated once into a [`FieldValue`].
//! Multi-valued fields then explode the document index-wise: row `k` takes the
//! `k`-th value of every multi field (null when a field is shorter) and repeats
//! the single-valued fields unchanged. Members of a paired group are read per
//! anchor element, so row `k` of a group always comes from the `k`-th element
//! and a missing sub-field is null in that row only. Rows are produced lazily
//! by [`Extraction::records`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use re3data_api::xml::{XPath, XmlDocument, XmlError};
use serde::Serialize;

use crate::field_map::{Cardinality, FieldMap, FieldSpec, ID_COLUMN, NAME_COLUMN};

/// Why a single document could not be turned into records.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("malformed document: {0}")]
    MalformedDocument(#[from] XmlError),
    #[error("missing required field '{0}'")]
    MissingRequiredField(String),
}

/// The evaluated value of one field in one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Absent,
    Single(String),
    Many(Vec<String>),
}

impl FieldValue {
    /// Builds the tagged value for `values` under the declared cardinality.
    pub fn from_values(values: Vec<String>, cardinality: Cardinality) -> Self {
        match cardinality {
            Cardinality::Single => match values.into_iter().next() {
                Some(first) => FieldValue::Single(first),
                None => FieldValue::Absent,
            },
            Cardinality::Multi if values.is_empty() => FieldValue::Absent,
            Cardinality::Multi => FieldValue::Many(values),
        }
    }

    /// Number of values present.
    pub fn len(&self) -> usize {
        match self {
            FieldValue::Absent => 0,
            FieldValue::Single(_) => 1,
            FieldValue::Many(values) => values.len(),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    pub fn first(&self) -> Option<&str> {
        self.get(0)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        match self {
            FieldValue::Absent => None,
            FieldValue::Single(value) => (index == 0).then_some(value.as_str()),
            FieldValue::Many(values) => values.get(index).map(String::as_str),
        }
    }
}

/// One flat output row.
///
/// `id` and `name` are always present; every other column maps to a value or
/// null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRecord {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<String>>,
}

impl RepositoryRecord {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter, mostly for tests and fixtures.
    pub fn with(mut self, column: &str, value: Option<&str>) -> Self {
        self.set(column, value.map(str::to_string));
        self
    }

    /// Value of `column`, or `None` when it is null or not a column of this record.
    pub fn get(&self, column: &str) -> Option<&str> {
        match column {
            ID_COLUMN => Some(&self.id),
            NAME_COLUMN => Some(&self.name),
            _ => self.values.get(column).and_then(|v| v.as_deref()),
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        column == ID_COLUMN || column == NAME_COLUMN || self.values.contains_key(column)
    }

    pub fn set(&mut self, column: &str, value: Option<String>) {
        match column {
            ID_COLUMN => {
                if let Some(value) = value {
                    self.id = value;
                }
            }
            NAME_COLUMN => {
                if let Some(value) = value {
                    self.name = value;
                }
            }
            _ => {
                self.values.insert(column.to_string(), value);
            }
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.get("url")
    }

    pub fn description(&self) -> Option<&str> {
        self.get("description")
    }
}

/// Advisory: a paired group whose members had different value counts in one
/// document. Extraction continues with null padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaggedFieldGroup {
    pub repository_id: String,
    /// `(field, value count)` for each group member, in group order.
    pub lengths: Vec<(String, usize)>,
}

impl fmt::Display for RaggedFieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .lengths
            .iter()
            .map(|(field, len)| format!("{}={}", field, len))
            .collect();
        write!(
            f,
            "{}: ragged field group ({})",
            self.repository_id,
            parts.join(", ")
        )
    }
}

/// One evaluated field: the tagged value plus the per-row cells.
#[derive(Debug, Clone)]
struct Column {
    name: String,
    cardinality: Cardinality,
    value: FieldValue,
    cells: Vec<Option<String>>,
}

impl Column {
    fn cell(&self, index: usize) -> Option<String> {
        let index = match self.cardinality {
            Cardinality::Single => 0,
            Cardinality::Multi => index,
        };
        self.cells.get(index).cloned().flatten()
    }
}

/// The evaluated fields of one document.
#[derive(Debug, Clone)]
pub struct Extraction {
    id: String,
    name: String,
    columns: Vec<Column>,
    rows: usize,
    warnings: Vec<RaggedFieldGroup>,
}

impl Extraction {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluated value of a declared field.
    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.columns
            .iter()
            .find(|c| c.name == field)
            .map(|c| &c.value)
    }

    /// Number of rows this document explodes into. Always at least one.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn warnings(&self) -> &[RaggedFieldGroup] {
        &self.warnings
    }

    /// Lazily yields the exploded rows in index order.
    pub fn records(&self) -> Records<'_> {
        Records {
            extraction: self,
            index: 0,
        }
    }

    fn record_at(&self, index: usize) -> RepositoryRecord {
        let values = self
            .columns
            .iter()
            .map(|column| (column.name.clone(), column.cell(index)))
            .collect();
        RepositoryRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            values,
        }
    }
}

/// Iterator over the rows of an [`Extraction`].
pub struct Records<'a> {
    extraction: &'a Extraction,
    index: usize,
}

impl Iterator for Records<'_> {
    type Item = RepositoryRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.extraction.rows {
            return None;
        }
        let record = self.extraction.record_at(self.index);
        self.index += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.extraction.rows.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Records<'_> {}

/// Parses `body` and extracts it with `map`.
pub fn extract(body: &str, map: &FieldMap) -> Result<Extraction, ExtractError> {
    let document = XmlDocument::parse(body)?;
    extract_document(&document, map)
}

/// Extracts an already parsed document.
///
/// `id` and `name` use first-match semantics but are required: a document
/// without either fails with [`ExtractError::MissingRequiredField`].
pub fn extract_document(
    document: &XmlDocument,
    map: &FieldMap,
) -> Result<Extraction, ExtractError> {
    let id = document
        .select_first(map.id_path())?
        .ok_or_else(|| ExtractError::MissingRequiredField(ID_COLUMN.to_string()))?;
    let name = document
        .select_first(map.name_path())?
        .ok_or_else(|| ExtractError::MissingRequiredField(NAME_COLUMN.to_string()))?;

    let mut grouped = grouped_cells(document, map)?;
    let mut columns = Vec::with_capacity(map.fields().len());
    for field in map.fields() {
        let column = match grouped.remove(field.name.as_str()) {
            Some(cells) => Column {
                name: field.name.clone(),
                cardinality: field.cardinality,
                value: FieldValue::from_values(
                    cells.iter().flatten().cloned().collect(),
                    field.cardinality,
                ),
                cells,
            },
            None => free_column(document, field)?,
        };
        columns.push(column);
    }

    let rows = columns
        .iter()
        .filter(|c| c.cardinality == Cardinality::Multi)
        .map(|c| c.cells.len())
        .max()
        .unwrap_or(0)
        .max(1);

    let mut warnings = Vec::new();
    for group in map.groups() {
        let lengths: Vec<(String, usize)> = group
            .members
            .iter()
            .map(|member| {
                let len = columns
                    .iter()
                    .find(|c| &c.name == member)
                    .map(|c| c.value.len())
                    .unwrap_or(0);
                (member.clone(), len)
            })
            .collect();
        let first = lengths.first().map(|(_, len)| *len);
        if lengths.iter().any(|(_, len)| Some(*len) != first) {
            let warning = RaggedFieldGroup {
                repository_id: id.clone(),
                lengths,
            };
            tracing::warn!("{}", warning);
            warnings.push(warning);
        }
    }

    tracing::debug!("Extracted {} ({} rows)", id, rows);

    Ok(Extraction {
        id,
        name,
        columns,
        rows,
        warnings,
    })
}

/// Cells of every paired field, one per anchor element.
fn grouped_cells<'m>(
    document: &XmlDocument,
    map: &'m FieldMap,
) -> Result<HashMap<&'m str, Vec<Option<String>>>, XmlError> {
    let mut cells = HashMap::new();
    for group in map.groups() {
        let members: Vec<&FieldSpec> = group
            .members
            .iter()
            .filter_map(|member| map.field(member))
            .collect();
        let paths: Vec<&XPath> = members.iter().map(|f| &f.path).collect();
        let rows = document.select_grouped(&group.anchor, &paths)?;
        for (i, field) in members.iter().enumerate() {
            let column = rows.iter().map(|row| row.get(i).cloned().flatten()).collect();
            cells.insert(field.name.as_str(), column);
        }
    }
    Ok(cells)
}

/// A field outside any group, evaluated from the document node.
fn free_column(document: &XmlDocument, field: &FieldSpec) -> Result<Column, XmlError> {
    let values = document.select(&field.path)?;
    let value = FieldValue::from_values(values, field.cardinality);
    let cells = match &value {
        FieldValue::Absent => Vec::new(),
        FieldValue::Single(v) => vec![Some(v.clone())],
        FieldValue::Many(vs) => vs.iter().cloned().map(Some).collect(),
    };
    Ok(Column {
        name: field.name.clone(),
        cardinality: field.cardinality,
        value,
        cells,
    })
}
