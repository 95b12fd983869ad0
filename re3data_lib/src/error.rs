//! Error types for the library layer.

use std::fmt;

use crate::field_map::FieldMapError;
use crate::table::TableError;

/// Errors that abort a harvest or a reporting step.
///
/// Per-document failures never show up here; they are recorded in the
/// [`HarvestReport`](crate::harvest::HarvestReport) and the run continues.
#[derive(Debug)]
pub enum HarvestError {
    /// The listing request failed, so there is nothing to harvest.
    Listing(re3data_api::Error),
    /// A field map could not be loaded or failed validation.
    FieldMap(FieldMapError),
    /// A table operation named a column the table does not have.
    Table(TableError),
    /// User-provided input failed validation.
    InvalidInput(String),
}

impl fmt::Display for HarvestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listing(e) => write!(f, "Listing failed: {}", e),
            Self::FieldMap(e) => write!(f, "Field map error: {}", e),
            Self::Table(e) => write!(f, "Table error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for HarvestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Listing(e) => Some(e),
            Self::FieldMap(e) => Some(e),
            Self::Table(e) => Some(e),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<re3data_api::Error> for HarvestError {
    fn from(e: re3data_api::Error) -> Self {
        Self::Listing(e)
    }
}

impl From<FieldMapError> for HarvestError {
    fn from(e: FieldMapError) -> Self {
        Self::FieldMap(e)
    }
}

impl From<TableError> for HarvestError {
    fn from(e: TableError) -> Self {
        Self::Table(e)
    }
}
