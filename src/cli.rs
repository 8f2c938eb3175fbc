use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::grid::DEFAULT_PAGE_SIZE;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Prepare CSV datasets for parallel-coordinates dashboards",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the dataset's columns with their inferred types
    Columns(ColumnsArgs),
    /// Render chart or grid rows for a column selection and brush
    Show(ShowArgs),
    /// Print the summary panel for the current selection
    Summary(SummaryArgs),
    /// Export all rows or the brushed rows as CSV
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// CSV endpoint to fetch (overrides `endpoint` in the config file)
    #[arg(long, conflicts_with = "input")]
    pub url: Option<String>,
    /// Local CSV file to load instead of fetching ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// YAML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct SelectionArgs {
    /// Columns to show (defaults to every column)
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
    /// Column used to color chart rows
    #[arg(long = "color")]
    pub color: Option<String>,
    /// Brush conditions such as `score >= 10` or `score in 2..8`
    #[arg(long = "brush", action = clap::ArgAction::Append)]
    pub brush: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum ViewKind {
    /// Truncated rows as the chart sees them
    Chart,
    /// Original rows as the grid shows them
    #[default]
    Grid,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    /// Which side of the dashboard to print
    #[arg(long = "view", value_enum, default_value = "grid")]
    pub view: ViewKind,
    /// Sort directive of the form `column[:asc|desc]`
    #[arg(long = "sort")]
    pub sort: Option<String>,
    /// 1-based page to print
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Rows per page (0 prints every row)
    #[arg(long = "page-size", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
    /// Output format for the rows
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormat,
    /// Mark the row with this id as the baseline
    #[arg(long = "baseline")]
    pub baseline: Option<i64>,
    /// Skip the summary panel
    #[arg(long = "no-summary")]
    pub no_summary: bool,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum ExportScope {
    All,
    Filtered,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    /// Export every row or only the brushed rows
    #[arg(long = "scope", value_enum)]
    pub scope: ExportScope,
    /// Directory receiving the export file ('-' writes to stdout)
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
