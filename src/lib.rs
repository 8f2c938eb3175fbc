pub mod cli;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod export;
pub mod fetch;
pub mod filter;
pub mod grid;
pub mod io_utils;
pub mod palette;
pub mod session;
pub mod summary;
pub mod truncate;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{
        Cli, ColumnsArgs, Commands, ExportArgs, ExportScope, OutputFormat, SelectionArgs,
        ShowArgs, SourceArgs, SummaryArgs, ViewKind,
    },
    config::Config,
    data::ColumnKind,
    error::DashboardError,
    fetch::{DataSource, LoadOptions},
    grid::SortKey,
    session::{Brushed, Session, View},
    truncate::{ID_COLUMN, TruncationIndex},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_parcoords", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Columns(args) => handle_columns(&args),
        Commands::Show(args) => handle_show(&args),
        Commands::Summary(args) => handle_summary(&args),
        Commands::Export(args) => handle_export(&args),
    }
}

fn resolve_source(args: &SourceArgs, config: &Config) -> Result<DataSource> {
    match (&args.url, &args.input, &config.endpoint) {
        (Some(url), _, _) => Ok(DataSource::Url(url.clone())),
        (None, Some(path), _) => Ok(DataSource::File(path.clone())),
        (None, None, Some(endpoint)) => Ok(DataSource::Url(endpoint.clone())),
        (None, None, None) => Err(anyhow!(
            "No data source: pass --url or --input, or set `endpoint` in the config file"
        )),
    }
}

fn open_session(args: &SourceArgs) -> Result<(Session, Vec<(String, ColumnKind)>)> {
    let config = Config::load_or_default(args.config.as_deref())?;
    let source = resolve_source(args, &config)?;
    let options = LoadOptions {
        delimiter: io_utils::resolve_input_delimiter(source.path(), args.delimiter),
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
    };
    debug!(
        "Reading {source} with delimiter '{}'",
        io_utils::printable_delimiter(options.delimiter)
    );
    let loaded = fetch::load(&source, options)?;
    Ok((Session::new(loaded.table, config), loaded.columns))
}

/// Applies column/color choices, redraws and brushes.
fn prepare(session: &mut Session, selection: &SelectionArgs) -> Result<(View, Option<Brushed>)> {
    if !selection.columns.is_empty() {
        let columns = selection
            .columns
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string())
            .collect::<Vec<_>>();
        session.select_columns(&columns);
    }
    if let Some(color) = &selection.color {
        session.set_color_column(color)?;
    }
    info!(
        "{}; coloring by {}",
        session.selection_label(),
        session.color_column().unwrap_or("<none>")
    );
    let view = session.render();
    let brushed = if selection.brush.is_empty() {
        None
    } else {
        let conditions = filter::parse_filters(&selection.brush)?;
        Some(
            session
                .brush(&view, &conditions)
                .context("Applying brush conditions")?,
        )
    };
    Ok((view, brushed))
}

fn handle_columns(args: &ColumnsArgs) -> Result<()> {
    let (session, columns) = open_session(&args.source)?;
    let index = TruncationIndex::build_with_limit(session.data(), session.config().text_length);
    let rows = columns
        .iter()
        .enumerate()
        .map(|(idx, (name, kind))| {
            vec![
                (idx + 1).to_string(),
                name.clone(),
                kind.to_string(),
                index.truncated_count(name).to_string(),
            ]
        })
        .collect::<Vec<_>>();
    let headers = vec![
        "#".to_string(),
        "name".to_string(),
        "type".to_string(),
        "truncated".to_string(),
    ];
    print!("{}", grid::render_table(&headers, &rows));
    info!("Listed {} column(s)", columns.len());
    Ok(())
}

fn handle_show(args: &ShowArgs) -> Result<()> {
    let (mut session, _) = open_session(&args.source)?;
    let (view, brushed) = prepare(&mut session, &args.selection)?;

    if view.is_empty() {
        println!("No data to display. Check filters.");
        if !args.no_summary {
            print!("{}", summary::render(None));
        }
        return Ok(());
    }

    if let Some(id) = args.baseline {
        match session.set_baseline(&view, id) {
            Some(record) => {
                let fields = record
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect::<Vec<_>>();
                println!("Baseline: {}", fields.join(", "));
            }
            None => warn!("Baseline id {id} is not part of the current view"),
        }
    }

    let active = brushed.as_ref().filter(|b| b.active);
    let rows = match (args.view, active) {
        (ViewKind::Chart, Some(brushed)) => &brushed.display,
        (ViewKind::Chart, None) => &view.chart,
        (ViewKind::Grid, Some(brushed)) => &brushed.grid,
        (ViewKind::Grid, None) => &view.grid,
    };
    let sorted = match &args.sort {
        Some(directive) => grid::sort_rows(rows, &SortKey::parse(directive)?),
        None => rows.clone(),
    };
    let page = grid::page(&sorted, args.page, args.page_size);

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&page.rows).context("Serializing rows")?;
            println!("{json}");
        }
        OutputFormat::Table => {
            let mut columns = vec![ID_COLUMN.to_string()];
            match args.view {
                ViewKind::Chart => columns.extend(view.axes.iter().cloned()),
                ViewKind::Grid => columns.extend(
                    view.grid
                        .columns()
                        .into_iter()
                        .filter(|column| column != ID_COLUMN),
                ),
            }
            let mut printed = page.rows.clone();
            if args.view == ViewKind::Chart
                && let Some(color_column) = view.color_column.as_deref()
            {
                printed = printed
                    .iter()
                    .map(|record| {
                        let mut record = record.clone();
                        let color = record
                            .get(color_column)
                            .and_then(|value| view.color.color(value))
                            .unwrap_or_default();
                        record.insert("color", color);
                        record
                    })
                    .collect();
                columns.push("color".to_string());
            }
            print!("{}", grid::render_grid(&printed, &columns));
            println!("{}", page.pager_line());
            if !args.no_summary {
                let summary_rows = active.map_or(&view.grid, |brushed| &brushed.grid);
                print!("{}", summary::render(session.summarize(summary_rows).as_ref()));
            }
        }
    }
    Ok(())
}

fn handle_summary(args: &SummaryArgs) -> Result<()> {
    let (mut session, _) = open_session(&args.source)?;
    let (view, brushed) = prepare(&mut session, &args.selection)?;
    let rows = match brushed.as_ref().filter(|b| b.active) {
        Some(brushed) => &brushed.grid,
        None => &view.grid,
    };
    print!("{}", summary::render(session.summarize(rows).as_ref()));
    Ok(())
}

fn handle_export(args: &ExportArgs) -> Result<()> {
    let (mut session, _) = open_session(&args.source)?;
    let result = match args.scope {
        ExportScope::All => export::export_all(&session, &args.output_dir),
        ExportScope::Filtered => {
            let (view, brushed) = prepare(&mut session, &args.selection)?;
            export::export_filtered(&session, &view, brushed.as_ref(), &args.output_dir)
        }
    };
    match result {
        Ok(path) => {
            info!("Export written to {path:?}");
            Ok(())
        }
        Err(err) => match err.downcast_ref::<DashboardError>() {
            Some(refusal) if refusal.is_warning() => {
                warn!("{refusal}");
                eprintln!("warning: {refusal}");
                Ok(())
            }
            _ => Err(err),
        },
    }
}
