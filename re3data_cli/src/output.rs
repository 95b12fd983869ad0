use anyhow::Result;
use re3data_lib::types::RepositoryLink;
use re3data_lib::{RepositoryRecord, Table as RecordTable};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::xml_output;

#[derive(Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
    Xml,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            "md" | "markdown" => OutputFormat::Markdown,
            "xml" => OutputFormat::Xml,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
pub(crate) struct LinkRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "id")]
    pub id: String,
    #[tabled(rename = "Link")]
    #[serde(rename = "href")]
    pub href: String,
}

#[derive(Tabled, Serialize)]
pub(crate) struct CountRow {
    #[tabled(rename = "Value")]
    #[serde(rename = "value")]
    pub value: String,
    #[tabled(rename = "Repositories")]
    #[serde(rename = "repositories")]
    pub repositories: usize,
}

// -- Row builders --

fn build_link_rows(links: &[RepositoryLink]) -> Vec<LinkRow> {
    links
        .iter()
        .map(|l| LinkRow {
            id: l.repository_id().unwrap_or_default().to_string(),
            href: l.href().to_string(),
        })
        .collect()
}

fn build_count_rows(counts: &[(String, usize)]) -> Vec<CountRow> {
    counts
        .iter()
        .map(|(value, count)| CountRow {
            value: value.clone(),
            repositories: *count,
        })
        .collect()
}

/// Cells in column order; nulls render as empty strings.
fn record_cells(columns: &[String], record: &RepositoryRecord) -> Vec<String> {
    columns
        .iter()
        .map(|c| record.get(c).unwrap_or_default().to_string())
        .collect()
}

fn records_table(columns: &[String], records: &[RepositoryRecord]) -> Table {
    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());
    for record in records {
        builder.push_record(record_cells(columns, record));
    }
    builder.build()
}

// -- Records --

pub fn print_records(table: &RecordTable, format: &OutputFormat) -> Result<()> {
    let columns = table.columns();
    let records = table.rows();
    match format {
        OutputFormat::Table => println!("{}", records_table(columns, records)),
        OutputFormat::Markdown => {
            let mut table = records_table(columns, records);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => table.write_csv(std::io::stdout())?,
        OutputFormat::Json => print_json(&records),
        OutputFormat::Xml => println!("{}", xml_output::records_to_xml(columns, records)?),
    }
    Ok(())
}

// -- Links --

pub fn print_links(links: &[RepositoryLink], format: &OutputFormat) -> Result<()> {
    let rows = build_link_rows(links);
    match format {
        OutputFormat::Table => println!("{}", Table::new(&rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(&rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => print_csv(&rows)?,
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Xml => println!("{}", xml_output::links_to_xml(links)?),
    }
    Ok(())
}

// -- Counts --

/// Prints grouped counts; table output is followed by a text bar chart.
pub fn print_counts(title: &str, counts: &[(String, usize)], format: &OutputFormat) -> Result<()> {
    let rows = build_count_rows(counts);
    match format {
        OutputFormat::Table => {
            println!("{}", title);
            println!("{}", Table::new(&rows));
            println!("{}", bar_chart(counts, 40));
        }
        OutputFormat::Markdown => {
            println!("### {}\n", title);
            let mut table = Table::new(&rows);
            table.with(Style::markdown());
            println!("{}\n", table);
        }
        OutputFormat::Csv => print_csv(&rows)?,
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Xml => println!("{}", xml_output::counts_to_xml(title, counts)?),
    }
    Ok(())
}

/// Horizontal bars scaled so the largest count spans `width` characters.
pub fn bar_chart(counts: &[(String, usize)], width: usize) -> String {
    let max = counts.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let label_width = counts.iter().map(|(v, _)| v.chars().count()).max().unwrap_or(0);
    counts
        .iter()
        .map(|(value, count)| {
            let len = if max == 0 { 0 } else { count * width / max };
            let len = if *count > 0 { len.max(1) } else { 0 };
            format!(
                "{:<label_width$} | {} {}",
                value,
                "#".repeat(len),
                count,
                label_width = label_width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// -- CSV / JSON --

fn print_csv<T: Serialize>(rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}
