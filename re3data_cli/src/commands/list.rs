//! The `list` subcommand: runs the listing request only and prints the links.

use anyhow::Result;
use clap::Args;
use re3data_lib::validation;
use re3data_lib::Client;

use super::FilterArgs;
use crate::output::{print_links, OutputFormat};

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Print at most this many links
    #[arg(long)]
    pub limit: Option<usize>,
}

pub async fn run(args: &ListArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let query = args.filters.to_query()?;
    let mut links = client.list_repositories(&query).await?;
    let total = links.len();

    if let Some(limit) = args.limit {
        links.truncate(validation::validate_limit(limit)?);
    }

    eprintln!("{} repositories match ({} shown)", total, links.len());
    print_links(&links, format)
}
