use std::fmt;

use crate::{data::Value, dataset::Table, truncate::ID_COLUMN};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub label: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub filtered: usize,
    pub total: usize,
    pub columns: Vec<ColumnSummary>,
}

pub const NO_DATA_MESSAGE: &str = "No data to summarize.";

/// `None` when `rows` is empty. An empty `columns` list summarizes every
/// numeric column except the row identifier.
pub fn summarize(rows: &Table, total: usize, columns: &[String]) -> Option<Summary> {
    if rows.is_empty() {
        return None;
    }
    let candidates: Vec<String> = if columns.is_empty() {
        rows.columns()
            .into_iter()
            .filter(|column| column != ID_COLUMN)
            .filter(|column| rows.column_values(column).any(Value::is_numeric))
            .collect()
    } else {
        columns
            .iter()
            .filter(|column| rows.has_column(column))
            .cloned()
            .collect()
    };

    let stats = candidates
        .into_iter()
        .filter_map(|column| summarize_column(rows, column))
        .collect();
    Some(Summary {
        filtered: rows.len(),
        total,
        columns: stats,
    })
}

fn summarize_column(rows: &Table, column: String) -> Option<ColumnSummary> {
    let values: Vec<f64> = rows.column_values(&column).filter_map(Value::as_f64).collect();
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(ColumnSummary {
        label: short_label(&column),
        mean: sum / values.len() as f64,
        min,
        max,
        column,
    })
}

/// `"EUI (Total) (kWh/m2)"` becomes `"EUI"`.
pub fn short_label(column: &str) -> String {
    column.split('(').next().unwrap_or(column).trim().to_string()
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Filtered Count: {} / {}", self.filtered, self.total)?;
        for stat in &self.columns {
            writeln!(
                f,
                "{}: {:.2} (Min: {:.2}, Max: {:.2})",
                stat.label, stat.mean, stat.min, stat.max
            )?;
        }
        Ok(())
    }
}

pub fn render(summary: Option<&Summary>) -> String {
    match summary {
        Some(summary) => summary.to_string(),
        None => format!("{NO_DATA_MESSAGE}\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;

    fn rows() -> Table {
        Table::new(vec![
            Record::from_pairs([
                ("id", Value::Integer(0)),
                ("EUI (Total) (kWh/m2)", Value::Float(100.0)),
                ("name", Value::from("a")),
            ]),
            Record::from_pairs([
                ("id", Value::Integer(1)),
                ("EUI (Total) (kWh/m2)", Value::Null),
                ("name", Value::from("b")),
            ]),
            Record::from_pairs([
                ("id", Value::Integer(2)),
                ("EUI (Total) (kWh/m2)", Value::Integer(50)),
                ("name", Value::from("c")),
            ]),
        ])
    }

    #[test]
    fn empty_rows_have_no_summary() {
        assert_eq!(summarize(&Table::empty(), 10, &[]), None);
        assert_eq!(render(None), "No data to summarize.\n");
    }

    #[test]
    fn default_columns_skip_identifier_and_text() {
        let summary = summarize(&rows(), 5, &[]).expect("summary");
        assert_eq!(summary.filtered, 3);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.columns.len(), 1);
        let eui = &summary.columns[0];
        assert_eq!(eui.label, "EUI");
        assert_eq!(eui.mean, 75.0);
        assert_eq!(eui.min, 50.0);
        assert_eq!(eui.max, 100.0);
    }

    #[test]
    fn configured_columns_missing_from_data_are_skipped() {
        let wanted = vec!["Gas (kWh)".to_string(), "name".to_string()];
        let summary = summarize(&rows(), 3, &wanted).expect("summary");
        assert!(summary.columns.is_empty());
    }

    #[test]
    fn display_uses_two_decimals() {
        let summary = summarize(&rows(), 3, &[]).expect("summary");
        assert_eq!(
            summary.to_string(),
            "Filtered Count: 3 / 3\nEUI: 75.00 (Min: 50.00, Max: 100.00)\n"
        );
    }
}
