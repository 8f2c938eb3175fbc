use std::borrow::Cow;
use std::fmt::Write as _;

use anyhow::{Result, anyhow};

use crate::{
    data::Value,
    dataset::{Record, Table},
};

pub const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub ascending: bool,
}

impl SortKey {
    /// Parses `column[:asc|desc]`.
    pub fn parse(directive: &str) -> Result<Self> {
        let trimmed = directive.trim();
        let (column, direction) = match trimmed.rsplit_once(':') {
            Some((column, dir)) if matches!(dir.to_ascii_lowercase().as_str(), "asc" | "desc") => {
                (column.trim(), Some(dir.to_ascii_lowercase()))
            }
            _ => (trimmed, None),
        };
        if column.is_empty() {
            return Err(anyhow!("Sort directive '{directive}' is missing a column name"));
        }
        Ok(Self {
            column: column.to_string(),
            ascending: direction.as_deref() != Some("desc"),
        })
    }
}

/// Stable sort on one column; rows without the column sort as null.
pub fn sort_rows(table: &Table, key: &SortKey) -> Table {
    let mut rows: Vec<Record> = table.rows().to_vec();
    rows.sort_by(|a, b| {
        let left = a.get(&key.column).unwrap_or(&Value::Null);
        let right = b.get(&key.column).unwrap_or(&Value::Null);
        let ordering = left.cmp(right);
        if key.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
    Table::new(rows)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub rows: Table,
    /// 1-based position of the first row shown, 0 when the page is empty.
    pub first: usize,
    pub last: usize,
    pub total: usize,
}

impl Page {
    pub fn pager_line(&self) -> String {
        if self.total == 0 {
            "Showing 0 of 0".to_string()
        } else if self.rows.is_empty() {
            format!("Showing 0 of {}", self.total)
        } else {
            format!("Showing {}-{} of {}", self.first, self.last, self.total)
        }
    }
}

/// 1-based page of `page_size` rows; a size of 0 shows everything.
pub fn page(table: &Table, page: usize, page_size: usize) -> Page {
    let total = table.len();
    let size = if page_size == 0 { total.max(1) } else { page_size };
    let start = page.saturating_sub(1).saturating_mul(size).min(total);
    let end = start.saturating_add(size).min(total);
    let rows = Table::new(table.rows()[start..end].to_vec());
    Page {
        first: if rows.is_empty() { 0 } else { start + 1 },
        last: end,
        total,
        rows,
    }
}

/// Renders `table` as aligned text using `columns` in order.
pub fn render_grid(table: &Table, columns: &[String]) -> String {
    let rows = table
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| record.get(column).map(Value::as_display).unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    render_table(columns, &rows)
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));

    let separator = widths
        .iter()
        .map(|w| "-".repeat((*w).max(3)))
        .collect::<Vec<_>>();
    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &separator_widths));

    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end_matches(' ').to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[i64]) -> Table {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Record::from_pairs([("id", Value::Integer(i as i64)), ("v", Value::Integer(*v))]))
            .collect()
    }

    #[test]
    fn sort_key_parses_direction_suffix() {
        assert_eq!(
            SortKey::parse("score:DESC").unwrap(),
            SortKey {
                column: "score".into(),
                ascending: false
            }
        );
        let plain = SortKey::parse("time:of:day").unwrap();
        assert_eq!(plain.column, "time:of:day");
        assert!(plain.ascending);
        assert!(SortKey::parse(":asc").is_err());
    }

    #[test]
    fn descending_sort_is_stable_for_ties() {
        let sorted = sort_rows(&numbers(&[2, 5, 2, 9]), &SortKey::parse("v:desc").unwrap());
        let ids: Vec<_> = sorted.column_values("id").cloned().collect();
        assert_eq!(
            ids,
            vec![Value::Integer(3), Value::Integer(1), Value::Integer(0), Value::Integer(2)]
        );
    }

    #[test]
    fn paging_clamps_to_table_bounds() {
        let table = numbers(&[1, 2, 3, 4, 5]);
        let second = page(&table, 2, 2);
        assert_eq!(second.rows.len(), 2);
        assert_eq!(second.pager_line(), "Showing 3-4 of 5");
        let beyond = page(&table, 9, 2);
        assert!(beyond.rows.is_empty());
        assert_eq!(beyond.pager_line(), "Showing 0 of 5");
        let all = page(&table, 1, 0);
        assert_eq!(all.rows.len(), 5);
    }

    #[test]
    fn render_grid_aligns_columns_and_flattens_control_characters() {
        let table = Table::new(vec![
            Record::from_pairs([("id", Value::Integer(1)), ("name", Value::from("Alice"))]),
            Record::from_pairs([("id", Value::Integer(2)), ("name", Value::from("B\nob"))]),
        ]);
        let rendered = render_grid(&table, &["id".to_string(), "name".to_string()]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines, vec!["id  name", "---  -----", "1   Alice", "2   B ob"]);
    }
}
