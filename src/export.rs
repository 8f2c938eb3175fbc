use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::info;

use crate::{
    dataset::Table,
    error::DashboardError,
    io_utils,
    session::{Brushed, Session, View},
};

pub fn write_csv<W: Write>(table: &Table, writer: &mut csv::Writer<W>) -> Result<()> {
    let columns = table.columns();
    if columns.is_empty() {
        return Ok(());
    }
    writer
        .write_record(&columns)
        .context("Writing CSV header")?;
    for (idx, record) in table.iter().enumerate() {
        let fields = columns
            .iter()
            .map(|column| record.get(column).map(|v| v.as_display()).unwrap_or_default());
        writer
            .write_record(fields)
            .with_context(|| format!("Writing row {}", idx + 1))?;
    }
    Ok(())
}

fn target_path(dir: &Path, file_name: &str) -> PathBuf {
    if io_utils::is_dash(dir) {
        dir.to_path_buf()
    } else {
        dir.join(file_name)
    }
}

fn write_file(table: &Table, path: &Path) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(Some(path), io_utils::DEFAULT_CSV_DELIMITER)?;
    write_csv(table, &mut writer)?;
    writer
        .flush()
        .with_context(|| format!("Flushing export {path:?}"))
}

/// Writes every loaded row as loaded. `dir` of `-` writes to stdout.
pub fn export_all(session: &Session, dir: &Path) -> Result<PathBuf> {
    let data = session.data();
    let path = target_path(dir, &session.config().export.all_file_name);
    write_file(data, &path)?;
    info!("Exported {} row(s) to {path:?}", data.len());
    Ok(path)
}

/// Restored rows of an active brush, or the warning to show instead.
pub fn filtered_selection(brushed: Option<&Brushed>) -> Result<&Table, DashboardError> {
    match brushed {
        Some(brushed) if brushed.active && brushed.grid.is_empty() => {
            Err(DashboardError::EmptySelection)
        }
        Some(brushed) if brushed.active => Ok(&brushed.grid),
        _ => Err(DashboardError::NoActiveFilter),
    }
}

/// Writes the brushed rows with original values. Refuses (with a warning
/// error) when nothing is filtered or the selection is empty.
pub fn export_filtered(
    session: &Session,
    view: &View,
    brushed: Option<&Brushed>,
    dir: &Path,
) -> Result<PathBuf> {
    let selection = filtered_selection(brushed)?;
    let path = target_path(dir, &session.config().export.filtered_file_name);
    write_file(selection, &path)?;
    info!(
        "Exported {} of {} visible row(s) to {path:?}",
        selection.len(),
        view.grid.len()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Config, DEFAULT_FILTERED_FILE_NAME},
        data::Value,
        dataset::Record,
        filter,
    };

    fn session() -> Session {
        let rows = (1..=3)
            .map(|i| {
                Record::from_pairs([
                    ("Permutation #", Value::Integer(i)),
                    (
                        "label",
                        Value::from(format!("A rather long label for option {i}")),
                    ),
                ])
            })
            .collect();
        Session::new(rows, Config::default())
    }

    #[test]
    fn write_csv_quotes_only_when_needed() {
        let table = Table::new(vec![Record::from_pairs([
            ("a", Value::from("x,y")),
            ("b", Value::Null),
            ("c", Value::Float(2.5)),
        ])]);
        let mut writer = io_utils::csv_writer(Vec::new(), b',');
        write_csv(&table, &mut writer).unwrap();
        let bytes = writer.into_inner().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "a,b,c\n\"x,y\",,2.5\n");
    }

    fn read_export(path: &Path) -> Vec<String> {
        let text = std::fs::read_to_string(path).expect("read export");
        assert!(text.starts_with(io_utils::UTF8_BOM));
        text.trim_start_matches(io_utils::UTF8_BOM)
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn export_all_writes_loaded_values_verbatim() {
        let long = format!("{}B", "A".repeat(20));
        let looks_truncated = format!("{}...", "A".repeat(20));
        let data = Table::new(vec![
            Record::from_pairs([("id", Value::from("12abc")), ("label", Value::from(long.clone()))]),
            Record::from_pairs([
                ("id", Value::from("x7")),
                ("label", Value::from(looks_truncated.clone())),
            ]),
        ]);
        let session = Session::new(data, Config::default());
        let dir = tempfile::tempdir().expect("temp dir");
        let path = export_all(&session, dir.path()).expect("export");
        assert_eq!(
            read_export(&path),
            vec![
                "id,label".to_string(),
                format!("12abc,{long}"),
                format!("x7,{looks_truncated}"),
            ]
        );
    }

    #[test]
    fn unfiltered_selection_is_refused() {
        assert!(matches!(
            filtered_selection(None),
            Err(DashboardError::NoActiveFilter)
        ));
    }

    #[test]
    fn excluded_rows_without_brush_are_not_a_filter() {
        let data = (0..3)
            .map(|i| Record::from_pairs([("Permutation #", Value::Integer(i))]))
            .collect();
        let session = Session::new(data, Config::default());
        let view = session.render();
        assert_eq!(view.grid.len(), 2);
        let brushed = session.brush(&view, &[]).unwrap();
        assert!(matches!(
            filtered_selection(Some(&brushed)),
            Err(DashboardError::NoActiveFilter)
        ));
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(export_filtered(&session, &view, None, dir.path()).is_err());
        assert!(!dir.path().join(DEFAULT_FILTERED_FILE_NAME).exists());
    }

    #[test]
    fn brush_with_no_matches_is_an_empty_selection() {
        let session = session();
        let view = session.render();
        let conditions = filter::parse_filters(&["Permutation # > 10".to_string()]).unwrap();
        let brushed = session.brush(&view, &conditions).unwrap();
        assert!(matches!(
            filtered_selection(Some(&brushed)),
            Err(DashboardError::EmptySelection)
        ));
    }

    #[test]
    fn brushed_rows_are_selected_with_original_values() {
        let session = session();
        let view = session.render();
        let conditions = filter::parse_filters(&["Permutation # >= 2".to_string()]).unwrap();
        let brushed = session.brush(&view, &conditions).unwrap();
        let selection = filtered_selection(Some(&brushed)).unwrap();
        assert_eq!(selection.len(), 2);
        assert_eq!(
            selection.rows()[0].get("label"),
            Some(&Value::from("A rather long label for option 2"))
        );
    }

    #[test]
    fn filtered_export_keeps_originals_that_look_truncated() {
        let long = format!("{}B", "A".repeat(20));
        let looks_truncated = format!("{}...", "A".repeat(20));
        let data = Table::new(vec![
            Record::from_pairs([
                ("Permutation #", Value::Integer(1)),
                ("label", Value::from(long.clone())),
            ]),
            Record::from_pairs([
                ("Permutation #", Value::Integer(2)),
                ("label", Value::from(looks_truncated.clone())),
            ]),
            Record::from_pairs([
                ("Permutation #", Value::Integer(3)),
                ("label", Value::from("short")),
            ]),
        ]);
        let session = Session::new(data, Config::default());
        let view = session.render();
        let conditions = filter::parse_filters(&["Permutation # <= 2".to_string()]).unwrap();
        let brushed = session.brush(&view, &conditions).unwrap();
        let dir = tempfile::tempdir().expect("temp dir");
        let path = export_filtered(&session, &view, Some(&brushed), dir.path()).expect("export");
        assert_eq!(
            read_export(&path),
            vec![
                "Permutation #,label,id".to_string(),
                format!("1,{long},0"),
                format!("2,{looks_truncated},1"),
            ]
        );
    }
}
