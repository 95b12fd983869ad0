//! Harvest driver: listing, then one detail fetch per link, then a table.
//!
//! Documents are fetched one after another in listing order. A document that
//! cannot be fetched or extracted is recorded as a [`HarvestFailure`] and
//! skipped; it never contributes a partial row. Only a failed listing request
//! aborts the run.

use std::fmt;
use std::sync::Arc;

use re3data_api::types::RepositoryLink;
use re3data_api::{Client, RepositoryQuery};
use serde::Serialize;

use crate::error::HarvestError;
use crate::extract::{extract, ExtractError, Extraction, RaggedFieldGroup};
use crate::field_map::FieldMap;
use crate::table::Table;

type Predicate = Arc<dyn Fn(&Extraction) -> bool + Send + Sync>;
type ProgressFn = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Which extracted documents make it into the table.
#[derive(Clone, Default)]
pub enum Inclusion {
    #[default]
    All,
    /// Drop documents where this column has no value at all.
    RequirePresent(String),
    Custom(Predicate),
}

impl Inclusion {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Extraction) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    pub fn includes(&self, extraction: &Extraction) -> bool {
        match self {
            Self::All => true,
            Self::RequirePresent(column) => match column.as_str() {
                crate::field_map::ID_COLUMN | crate::field_map::NAME_COLUMN => true,
                _ => extraction
                    .value(column)
                    .map(|value| !value.is_absent())
                    .unwrap_or(false),
            },
            Self::Custom(predicate) => predicate(extraction),
        }
    }
}

impl fmt::Debug for Inclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::RequirePresent(column) => f.debug_tuple("RequirePresent").field(column).finish(),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// The detail request failed or returned a non-success status.
    Transport,
    MalformedDocument,
    MissingRequiredField,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Transport => "transport",
            Self::MalformedDocument => "malformed document",
            Self::MissingRequiredField => "missing required field",
        };
        f.write_str(label)
    }
}

/// A document that was skipped.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HarvestFailure {
    pub link: RepositoryLink,
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for HarvestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.link, self.kind, self.message)
    }
}

impl HarvestFailure {
    fn transport(link: &RepositoryLink, error: &re3data_api::Error) -> Self {
        Self {
            link: link.clone(),
            kind: FailureKind::Transport,
            message: error.to_string(),
        }
    }

    fn extraction(link: &RepositoryLink, error: &ExtractError) -> Self {
        let kind = match error {
            ExtractError::MalformedDocument(_) => FailureKind::MalformedDocument,
            ExtractError::MissingRequiredField(_) => FailureKind::MissingRequiredField,
        };
        Self {
            link: link.clone(),
            kind,
            message: error.to_string(),
        }
    }
}

/// Outcome of a harvest run.
#[derive(Clone, Debug, Serialize)]
pub struct HarvestReport {
    pub table: Table,
    pub failures: Vec<HarvestFailure>,
    pub warnings: Vec<RaggedFieldGroup>,
    /// Number of detail links attempted.
    pub fetched: usize,
}

impl HarvestReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn ragged_count(&self) -> usize {
        self.warnings.len()
    }
}

/// Drives a harvest against one client with one field map.
pub struct Harvester {
    client: Client,
    field_map: FieldMap,
    limit: Option<usize>,
    inclusion: Inclusion,
    progress: Option<ProgressFn>,
}

impl Harvester {
    pub fn new(client: Client, field_map: FieldMap) -> Self {
        Self {
            client,
            field_map,
            limit: None,
            inclusion: Inclusion::All,
            progress: None,
        }
    }

    /// Only the first `limit` links of the listing are fetched.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_inclusion(mut self, inclusion: Inclusion) -> Self {
        self.inclusion = inclusion;
        self
    }

    /// Called with `(done, total)` after every document.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    /// Fetches the listing for `query` and harvests every link on it.
    pub async fn harvest(&self, query: &RepositoryQuery) -> Result<HarvestReport, HarvestError> {
        let links = self
            .client
            .list_repositories(query)
            .await
            .map_err(HarvestError::Listing)?;
        Ok(self.harvest_links(&links).await)
    }

    /// Harvests a known list of detail links, skipping the listing request.
    pub async fn harvest_links(&self, links: &[RepositoryLink]) -> HarvestReport {
        let links = match self.limit {
            Some(limit) => &links[..limit.min(links.len())],
            None => links,
        };
        let total = links.len();

        let mut outcomes = Vec::with_capacity(total);
        for (done, link) in links.iter().enumerate() {
            let fetched = self.client.get_repository(link).await;
            outcomes.push(process_document(link, fetched, &self.field_map));
            if let Some(progress) = &self.progress {
                progress(done + 1, total);
            }
        }

        let report = build_report(self.field_map.columns(), &self.inclusion, outcomes);
        tracing::info!(
            "Harvested {} rows from {} documents ({} skipped, {} ragged)",
            report.table.len(),
            report.fetched,
            report.failure_count(),
            report.ragged_count()
        );
        report
    }
}

/// Turns one fetch result into an extraction or a recorded failure.
fn process_document(
    link: &RepositoryLink,
    fetched: Result<String, re3data_api::Error>,
    field_map: &FieldMap,
) -> Result<Extraction, HarvestFailure> {
    let body = fetched.map_err(|e| {
        let failure = HarvestFailure::transport(link, &e);
        tracing::warn!("Skipping {}", failure);
        failure
    })?;
    extract(&body, field_map).map_err(|e| {
        let failure = HarvestFailure::extraction(link, &e);
        tracing::warn!("Skipping {}", failure);
        failure
    })
}

/// Folds per-document outcomes, in order, into a report.
fn build_report(
    columns: Vec<String>,
    inclusion: &Inclusion,
    outcomes: Vec<Result<Extraction, HarvestFailure>>,
) -> HarvestReport {
    let fetched = outcomes.len();
    let mut failures = Vec::new();
    let mut warnings = Vec::new();
    let mut extractions = Vec::new();

    for outcome in outcomes {
        match outcome {
            Ok(extraction) => {
                warnings.extend_from_slice(extraction.warnings());
                if inclusion.includes(&extraction) {
                    extractions.push(extraction);
                } else {
                    tracing::debug!("Excluded {}", extraction.id());
                }
            }
            Err(failure) => failures.push(failure),
        }
    }

    let table = Table::assemble(columns, extractions.iter().map(Extraction::records));
    HarvestReport {
        table,
        failures,
        warnings,
        fetched,
    }
}
