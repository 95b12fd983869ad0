//! CLI subcommand implementations.

pub mod apis;
pub mod harvest;
pub mod list;
pub mod types;

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use re3data_lib::validation;
use re3data_lib::{FilterKey, HarvestReport, Query, RepositoryQuery};

/// Listing filters shared by every subcommand that hits the listing endpoint.
///
/// Every flag may be repeated; repeated values are sent as repeated parameters.
#[derive(Args, Default)]
pub struct FilterArgs {
    /// Free-text search
    #[arg(long)]
    pub search: Option<String>,

    /// DFG subject (e.g. "34 Geosciences (including Geography)")
    #[arg(long)]
    pub subject: Vec<String>,

    /// Data upload policy: open, restricted, closed
    #[arg(long)]
    pub data_upload: Vec<String>,

    /// Persistent identifier system (e.g. DOI, hdl)
    #[arg(long)]
    pub pid_system: Vec<String>,

    /// Certificate name (e.g. CoreTrustSeal)
    #[arg(long)]
    pub certificate: Vec<String>,

    /// Content type
    #[arg(long)]
    pub content_type: Vec<String>,

    /// ISO 3166-1 alpha-3 country code (e.g. DEU)
    #[arg(long)]
    pub country: Vec<String>,

    /// Repository type: disciplinary, institutional, other
    #[arg(long = "type")]
    pub repository_type: Vec<String>,

    /// API type (e.g. OAI-PMH, REST)
    #[arg(long)]
    pub api_type: Vec<String>,

    /// Any other listing parameter as key=value (e.g. "dataLicenses[]=CC0")
    #[arg(long)]
    pub filter: Vec<String>,
}

impl FilterArgs {
    /// Validates every flag and builds the listing query.
    pub fn to_query(&self) -> Result<RepositoryQuery> {
        let mut query = RepositoryQuery::default();

        if let Some(ref search) = self.search {
            let sanitized = validation::validate_search(search)?;
            query = query.with_search(&sanitized);
        }

        let simple = [
            (FilterKey::Subject, &self.subject),
            (FilterKey::DataUpload, &self.data_upload),
            (FilterKey::PidSystem, &self.pid_system),
            (FilterKey::Certificate, &self.certificate),
            (FilterKey::ContentType, &self.content_type),
            (FilterKey::RepositoryType, &self.repository_type),
            (FilterKey::ApiType, &self.api_type),
        ];
        for (key, values) in simple {
            for value in values {
                let validated = validation::validate_filter_value(value)?;
                query = query.with_filter(key.clone(), &validated);
            }
        }

        for country in &self.country {
            let validated = validation::validate_country(country)?;
            query = query.with_country(&validated);
        }

        for pair in &self.filter {
            let (key, value) = validation::parse_filter_pair(pair)?;
            let key = key
                .parse::<FilterKey>()
                .unwrap_or(FilterKey::Custom(key));
            query = query.with_filter(key, &value);
        }

        Ok(query)
    }
}

/// Progress bar driven by the harvester's `(done, total)` callback.
pub fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} {msg}",
    ) {
        pb.set_style(style);
    }
    pb.set_message("fetching repository records...");
    pb
}

/// Prints skipped documents and ragged groups to stderr.
pub fn print_summary(report: &HarvestReport) {
    eprintln!(
        "Harvested {} rows from {} documents ({} skipped, {} ragged)",
        report.table.len(),
        report.fetched,
        report.failure_count(),
        report.ragged_count()
    );
    for failure in &report.failures {
        eprintln!("  skipped {}", failure);
    }
    for warning in &report.warnings {
        eprintln!("  warning {}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing_url(args: &FilterArgs) -> String {
        let url = url::Url::parse("https://example.com/api/beta/repositories").unwrap();
        args.to_query().unwrap().add_to_url(&url).to_string()
    }

    #[test]
    fn empty_args_build_empty_query() {
        assert!(FilterArgs::default().to_query().unwrap().is_empty());
    }

    #[test]
    fn flags_map_to_wire_parameters() {
        let args = FilterArgs {
            search: Some(" ocean ".to_string()),
            country: vec!["deu".to_string()],
            api_type: vec!["OAI-PMH".to_string()],
            filter: vec!["pid=DOI".to_string(), "dataLicenses[]=CC0".to_string()],
            ..Default::default()
        };
        assert_eq!(
            listing_url(&args),
            "https://example.com/api/beta/repositories?query=ocean&apis%5B%5D=OAI-PMH&countries%5B%5D=DEU&pidSystems%5B%5D=DOI&dataLicenses%5B%5D=CC0"
        );
    }

    #[test]
    fn invalid_country_is_rejected() {
        let args = FilterArgs {
            country: vec!["Germany".to_string()],
            ..Default::default()
        };
        assert!(args.to_query().is_err());
    }
}
