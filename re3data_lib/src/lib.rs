//! Library layer for the re3data harvester: field maps, record extraction,
//! table assembly, the harvest driver, and analysis helpers.
//!
//! Wraps the `re3data_api` crate, which owns HTTP access and XML parsing.

pub mod analysis;
pub mod error;
pub mod extract;
pub mod field_map;
pub mod harvest;
pub mod table;
pub mod validation;

pub use re3data_api;
pub use re3data_api::types;
pub use re3data_api::{Client, FilterKey, Query, RepositoryQuery};

pub use error::HarvestError;
pub use extract::{extract, ExtractError, Extraction, FieldValue, RaggedFieldGroup, RepositoryRecord};
pub use field_map::{Cardinality, FieldGroup, FieldMap, FieldMapError};
pub use harvest::{FailureKind, HarvestFailure, HarvestReport, Harvester, Inclusion};
pub use table::{Coercion, SortDirection, Table, TableError};
