//! The `types` subcommand: repository types and certificate presence.

use anyhow::Result;
use clap::Args;
use re3data_lib::analysis::{count_per_repository, distinct_repositories};
use re3data_lib::validation;
use re3data_lib::{Client, Coercion, FieldMap, Harvester};

use super::{print_summary, progress_bar, FilterArgs};
use crate::output::{print_counts, OutputFormat};

#[derive(Args)]
pub struct TypesArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Fetch at most this many repository records
    #[arg(long)]
    pub limit: Option<usize>,
}

pub async fn run(args: &TypesArgs, client: Client, format: &OutputFormat) -> Result<()> {
    let query = args.filters.to_query()?;
    let pb = progress_bar();
    let progress = pb.clone();

    let mut harvester = Harvester::new(client, FieldMap::preset("types")?).on_progress(
        move |done, total| {
            progress.set_length(total as u64);
            progress.set_position(done as u64);
        },
    );
    if let Some(limit) = args.limit {
        harvester = harvester.with_limit(validation::validate_limit(limit)?);
    }

    let report = harvester.harvest(&query).await?;
    pb.finish_and_clear();
    print_summary(&report);

    let table = report
        .table
        .coerce("certificate", Coercion::Presence)?
        .coerce("type", Coercion::Categorical)?;
    let repositories = distinct_repositories(&table);

    print_counts(
        &format!("Repository types across {} repositories", repositories),
        &count_per_repository(&table, "type")?,
        format,
    )?;
    print_counts(
        "Certificate present",
        &count_per_repository(&table, "certificate")?,
        format,
    )
}
