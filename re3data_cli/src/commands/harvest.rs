//! The `harvest` subcommand: listing, detail fetches, extraction, and a table.
//!
//! The table can be reshaped before printing: presence coercion, dedup by a
//! column list, a single-column sort, and a row cap. `--csv` writes the full
//! reshaped table to a file regardless of `--output`.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use re3data_lib::validation;
use re3data_lib::{Client, Coercion, FieldMap, Harvester, Inclusion, SortDirection, Table};

use super::{print_summary, progress_bar, FilterArgs};
use crate::output::{print_records, OutputFormat};

#[derive(Args)]
pub struct HarvestArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Built-in field map: repositories, apis, types, certificates, subjects
    #[arg(long, default_value = "repositories", conflicts_with = "field_map")]
    pub preset: String,

    /// Field map YAML file (same layout as one built-in preset)
    #[arg(long)]
    pub field_map: Option<PathBuf>,

    /// Harvest these repository IDs directly instead of running the listing
    #[arg(long = "id")]
    pub ids: Vec<String>,

    /// Fetch at most this many repository records
    #[arg(long)]
    pub limit: Option<usize>,

    /// Keep only repositories with a value in this column
    #[arg(long)]
    pub require: Option<String>,

    /// Replace a column with "true"/"false" depending on whether it has a value
    #[arg(long)]
    pub presence: Vec<String>,

    /// Keep the first row per distinct combination of these columns (comma-separated)
    #[arg(long)]
    pub dedup: Option<String>,

    /// Sort rows by this column (byte order, nulls first)
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Print only the first N rows
    #[arg(long)]
    pub head: Option<usize>,

    /// Also write the table to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

fn load_field_map(args: &HarvestArgs) -> Result<FieldMap> {
    match &args.field_map {
        Some(path) => {
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("reading field map {}", path.display()))?;
            Ok(FieldMap::from_yaml(&yaml)?)
        }
        None => Ok(FieldMap::preset(args.preset.trim())?),
    }
}

/// Applies the reshaping flags in a fixed order: presence, dedup, sort.
fn reshape(table: Table, args: &HarvestArgs) -> Result<Table> {
    let mut table = table;

    for column in &args.presence {
        let column = validation::validate_column(column, table.columns())?;
        table = table.coerce(&column, Coercion::Presence)?;
    }

    if let Some(ref dedup) = args.dedup {
        let key: Vec<String> = dedup
            .split(',')
            .map(|c| validation::validate_column(c, table.columns()))
            .collect::<Result<_, _>>()?;
        let key: Vec<&str> = key.iter().map(String::as_str).collect();
        table = table.dedup_by(&key)?;
    }

    if let Some(ref sort) = args.sort {
        let column = validation::validate_column(sort, table.columns())?;
        let direction = if args.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        table = table.sort_by(&column, direction)?;
    }

    Ok(table)
}

pub async fn run(args: &HarvestArgs, client: Client, format: &OutputFormat) -> Result<()> {
    let field_map = load_field_map(args)?;
    let columns = field_map.columns();

    let inclusion = match &args.require {
        Some(column) => Inclusion::RequirePresent(validation::validate_column(column, &columns)?),
        None => Inclusion::All,
    };

    let pb = progress_bar();
    let progress = pb.clone();
    let mut harvester = Harvester::new(client, field_map)
        .with_inclusion(inclusion)
        .on_progress(move |done, total| {
            progress.set_length(total as u64);
            progress.set_position(done as u64);
        });
    if let Some(limit) = args.limit {
        harvester = harvester.with_limit(validation::validate_limit(limit)?);
    }

    let report = if args.ids.is_empty() {
        harvester.harvest(&args.filters.to_query()?).await?
    } else {
        let mut links = Vec::with_capacity(args.ids.len());
        for id in &args.ids {
            let id = validation::validate_repository_id(id)?;
            links.push(harvester.client().repository_link(&id)?);
        }
        harvester.harvest_links(&links).await
    };
    pb.finish_and_clear();
    print_summary(&report);

    let table = reshape(report.table, args)?;

    if let Some(ref path) = args.csv {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        table.write_csv(file)?;
        eprintln!("Wrote {} rows to {}", table.len(), path.display());
    }

    let table = match args.head {
        Some(n) => table.head(n),
        None => table,
    };
    print_records(&table, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use re3data_lib::RepositoryRecord;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: HarvestArgs,
    }

    fn parse(argv: &[&str]) -> HarvestArgs {
        let mut full = vec!["re3data"];
        full.extend_from_slice(argv);
        TestCli::parse_from(full).args
    }

    fn table() -> Table {
        let columns = ["id", "name", "api", "api_type"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let row = |id: &str, api: Option<&str>, api_type: Option<&str>| {
            RepositoryRecord::new(id, "Repo")
                .with("api", api)
                .with("api_type", api_type)
        };
        Table::assemble(
            columns,
            vec![vec![
                row("r2", Some("a"), Some("REST")),
                row("r2", Some("b"), Some("REST")),
                row("r1", None, None),
            ]],
        )
    }

    #[test]
    fn parses_repeatable_flags() {
        let args = parse(&["--id", "r3d100010134", "--id", "r3d100000001", "--head", "5"]);
        assert_eq!(args.ids.len(), 2);
        assert_eq!(args.head, Some(5));
        assert_eq!(args.preset, "repositories");
    }

    #[test]
    fn preset_and_field_map_conflict() {
        let result = TestCli::try_parse_from(["re3data", "--preset", "apis", "--field-map", "x.yml"]);
        assert!(result.is_err());
    }

    #[test]
    fn reshape_dedups_then_sorts() {
        let args = parse(&["--dedup", "id,api_type", "--sort", "id"]);
        let table = reshape(table(), &args).unwrap();
        let ids: Vec<&str> = table.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[test]
    fn reshape_presence() {
        let args = parse(&["--presence", "api"]);
        let table = reshape(table(), &args).unwrap();
        assert_eq!(
            table.column_values("api").unwrap(),
            vec![Some("true"), Some("true"), Some("false")]
        );
    }

    #[test]
    fn reshape_rejects_unknown_columns() {
        let args = parse(&["--sort", "nope"]);
        assert!(reshape(table(), &args).is_err());
    }

    #[test]
    fn loads_presets() {
        let args = parse(&["--preset", "apis"]);
        let map = load_field_map(&args).unwrap();
        assert!(map.columns().contains(&"api_type".to_string()));
        assert!(load_field_map(&parse(&["--preset", "nope"])).is_err());
    }
}
