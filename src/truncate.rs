//! Reversible shortening of long text values for chart axis labels.
//!
//! A [`TruncationIndex`] maps, per column, every original value to the value
//! shown on the chart. Long text becomes a fixed-length prefix followed by
//! [`ELLIPSIS`]; prefixes shared by different originals get a ` 2`, ` 3`, ...
//! suffix so that no two originals in a column share a display value. The
//! index is inverted into an [`InvertedIndex`] to restore originals for the
//! grid and for exports.
//!
//! Numbering of colliding prefixes follows first encounter in row order, so
//! the same table always produces the same index.

use std::collections::{HashMap, HashSet};

use log::trace;
use regex::Regex;

use crate::{
    data::Value,
    dataset::{Record, Table},
};

/// Character count above which text is shortened.
pub const DEFAULT_TEXT_LENGTH: usize = 20;
pub const ELLIPSIS: &str = "...";
/// Column whose values are forced to integers after restoring.
pub const ID_COLUMN: &str = "id";

type ColumnLookup = HashMap<Value, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TruncationIndex {
    columns: Vec<String>,
    lookup: HashMap<String, ColumnLookup>,
}

impl TruncationIndex {
    pub fn build(table: &Table) -> Self {
        Self::build_with_limit(table, DEFAULT_TEXT_LENGTH)
    }

    /// Indexes every column of the table's first record.
    pub fn build_with_limit(table: &Table, text_length: usize) -> Self {
        let columns = table.columns();
        let mut lookup = HashMap::with_capacity(columns.len());

        for column in &columns {
            let mut mapping = ColumnLookup::new();
            let mut displayed: HashSet<Value> = HashSet::new();
            for record in table {
                let Some(value) = record.get(column) else {
                    continue;
                };
                if mapping.contains_key(value) {
                    continue;
                }
                let display = match value {
                    Value::String(text) if is_long_text(text, text_length) => {
                        let candidate = format!("{}{ELLIPSIS}", prefix(text, text_length));
                        Value::String(first_unused(&displayed, candidate))
                    }
                    other => other.clone(),
                };
                displayed.insert(display.clone());
                mapping.insert(value.clone(), display);
            }
            trace!(
                "Indexed {} distinct value(s) for column '{column}'",
                mapping.len()
            );
            lookup.insert(column.clone(), mapping);
        }

        Self { columns, lookup }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn display_value(&self, column: &str, original: &Value) -> Option<&Value> {
        self.lookup.get(column)?.get(original)
    }

    /// Number of values under `column` whose display differs from the original.
    pub fn truncated_count(&self, column: &str) -> usize {
        self.lookup.get(column).map_or(0, |mapping| {
            mapping
                .iter()
                .filter(|(original, display)| original != display)
                .count()
        })
    }

    /// Produces the display table. Unknown columns and values pass through.
    pub fn apply(&self, table: &Table) -> Table {
        if self.lookup.is_empty() {
            return table.clone();
        }
        table
            .iter()
            .map(|record| map_record(record, &self.lookup))
            .collect()
    }

    pub fn invert(&self) -> InvertedIndex {
        let lookup = self
            .lookup
            .iter()
            .map(|(column, mapping)| {
                let inverted = mapping
                    .iter()
                    .map(|(original, display)| (display.clone(), original.clone()))
                    .collect::<ColumnLookup>();
                (column.clone(), inverted)
            })
            .collect();
        InvertedIndex { lookup }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvertedIndex {
    lookup: HashMap<String, ColumnLookup>,
}

impl InvertedIndex {
    pub fn original_value(&self, column: &str, display: &Value) -> Option<&Value> {
        self.lookup.get(column)?.get(display)
    }

    /// Restores original values, then coerces [`ID_COLUMN`] to an integer.
    pub fn restore(&self, table: &Table) -> Table {
        table
            .iter()
            .map(|record| {
                let mut restored = map_record(record, &self.lookup);
                if let Some(id) = restored.get(ID_COLUMN)
                    && id.is_truthy()
                {
                    let coerced = coerce_identifier(id);
                    restored.insert(ID_COLUMN, coerced);
                }
                restored
            })
            .collect()
    }
}

fn map_record(record: &Record, lookup: &HashMap<String, ColumnLookup>) -> Record {
    let mut mapped = Record::new();
    for (column, value) in record.iter() {
        let replacement = lookup
            .get(column)
            .and_then(|mapping| mapping.get(value))
            .unwrap_or(value);
        mapped.insert(column, replacement.clone());
    }
    mapped
}

/// Text longer than `text_length` characters, except a lone space.
pub fn is_long_text(text: &str, text_length: usize) -> bool {
    text != " " && text.chars().count() > text_length
}

fn prefix(text: &str, text_length: usize) -> &str {
    match text.char_indices().nth(text_length) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn first_unused(displayed: &HashSet<Value>, candidate: String) -> String {
    if !displayed.contains(&Value::String(candidate.clone())) {
        return candidate;
    }
    let mut n = 2usize;
    loop {
        let numbered = format!("{candidate} {n}");
        if !displayed.contains(&Value::String(numbered.clone())) {
            return numbered;
        }
        n += 1;
    }
}

fn leading_integer() -> &'static Regex {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid identifier pattern"))
}

/// Integer form of an identifier: leading digits of text, floats truncated.
/// Values with no integer reading are returned unchanged.
pub fn coerce_identifier(value: &Value) -> Value {
    match value {
        Value::Integer(_) => value.clone(),
        Value::Float(f) if f.is_finite() => Value::Integer(f.trunc() as i64),
        Value::String(text) => leading_integer()
            .captures(text)
            .and_then(|caps| caps[1].parse::<i64>().ok())
            .map(Value::Integer)
            .unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}
