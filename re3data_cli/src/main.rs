mod commands;
mod output;
mod xml_output;

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use re3data_lib::Client;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "re3data")]
#[command(about = "Harvest research data repository records from re3data.org")]
struct Cli {
    /// Output format: table, markdown, csv, json, xml
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List repositories matching the filters (listing request only)
    List(commands::list::ListArgs),
    /// Fetch repository records and print them as a table
    Harvest(Box<commands::harvest::HarvestArgs>),
    /// Count repositories per API type
    Apis(commands::apis::ApisArgs),
    /// Count repositories per type and by certificate presence
    Types(commands::types::TypesArgs),
}

/// Builds the API client from `RE3DATA_BASE_URL` and `RE3DATA_TIMEOUT_SECS`.
/// Unset or unparsable values fall back to the defaults.
fn client_from_env() -> Client {
    let client = match std::env::var("RE3DATA_BASE_URL") {
        Ok(url) if !url.trim().is_empty() => Client::with_base_url(url.trim()),
        _ => Client::new(),
    };
    let timeout = std::env::var("RE3DATA_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0);
    match timeout {
        Some(secs) => client.with_timeout(Duration::from_secs(secs)),
        None => client,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("re3data=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(cli.output.as_str());
    let client = client_from_env();

    match &cli.command {
        Commands::List(args) => commands::list::run(args, &client, &format).await?,
        Commands::Harvest(args) => commands::harvest::run(args.as_ref(), client, &format).await?,
        Commands::Apis(args) => commands::apis::run(args, client, &format).await?,
        Commands::Types(args) => commands::types::run(args, client, &format).await?,
    }

    Ok(())
}
