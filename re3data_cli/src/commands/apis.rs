//! The `apis` subcommand: which API types do repositories offer?
//!
//! Only repositories with at least one API entry are kept, and each repository
//! counts once per API type.

use anyhow::Result;
use clap::Args;
use re3data_lib::analysis::{count_per_repository, distinct_repositories};
use re3data_lib::validation;
use re3data_lib::{Client, FieldMap, Harvester, Inclusion};

use super::{print_summary, progress_bar, FilterArgs};
use crate::output::{print_counts, OutputFormat};

#[derive(Args)]
pub struct ApisArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Fetch at most this many repository records
    #[arg(long)]
    pub limit: Option<usize>,
}

pub async fn run(args: &ApisArgs, client: Client, format: &OutputFormat) -> Result<()> {
    let query = args.filters.to_query()?;
    let pb = progress_bar();
    let progress = pb.clone();

    let mut harvester = Harvester::new(client, FieldMap::preset("apis")?)
        .with_inclusion(Inclusion::RequirePresent("api".to_string()))
        .on_progress(move |done, total| {
            progress.set_length(total as u64);
            progress.set_position(done as u64);
        });
    if let Some(limit) = args.limit {
        harvester = harvester.with_limit(validation::validate_limit(limit)?);
    }

    let report = harvester.harvest(&query).await?;
    pb.finish_and_clear();
    print_summary(&report);

    let counts = count_per_repository(&report.table, "api_type")?;
    let title = format!(
        "API types across {} repositories",
        distinct_repositories(&report.table)
    );
    print_counts(&title, &counts, format)
}
