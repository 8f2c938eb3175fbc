use std::io::Read;

use anyhow::{Context, Result};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::data::{ColumnKind, Value, infer_column_kinds, parse_typed_value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Record::new();
        for (key, value) in pairs {
            record.insert(key, value);
        }
        record
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Replaces the value of an existing column in place, or appends a new one.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Keeps only `columns`, in the order given. Missing columns are skipped.
    pub fn project(&self, columns: &[String]) -> Record {
        let fields = columns
            .iter()
            .filter_map(|column| {
                self.get(column)
                    .map(|value| (column.clone(), value.clone()))
            })
            .collect();
        Record { fields }
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Record>,
}

impl Table {
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Column names of the first record; empty for an empty table.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|record| record.columns().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.rows
            .first()
            .is_some_and(|record| record.contains(column))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.rows.iter()
    }

    pub fn push(&mut self, record: Record) {
        self.rows.push(record);
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.rows.get(index)
    }

    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().filter_map(move |record| record.get(column))
    }

    pub fn into_rows(self) -> Vec<Record> {
        self.rows
    }

    /// Reads a headed CSV stream, inferring one [`ColumnKind`] per column.
    pub fn from_csv<R: Read>(reader: &mut csv::Reader<R>) -> Result<(Table, Vec<ColumnKind>)> {
        let headers = reader
            .headers()
            .context("Reading CSV header row")?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut raw_rows = Vec::new();
        for (row_idx, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
            raw_rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let kinds = infer_column_kinds(headers.len(), &raw_rows);
        let mut rows = Vec::with_capacity(raw_rows.len());
        for (row_idx, raw) in raw_rows.iter().enumerate() {
            let mut record = Record::new();
            for (col_idx, header) in headers.iter().enumerate() {
                let cell = raw.get(col_idx).map(String::as_str).unwrap_or("");
                let value = parse_typed_value(cell, kinds[col_idx]).with_context(|| {
                    format!("Parsing column '{header}' in row {}", row_idx + 2)
                })?;
                record.insert(header.clone(), value);
            }
            rows.push(record);
        }
        Ok((Table::new(rows), kinds))
    }
}

impl FromIterator<Record> for Table {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        Table::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(text: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes())
    }

    #[test]
    fn insert_replaces_existing_column_in_place() {
        let mut record = Record::from_pairs([("a", Value::Integer(1)), ("b", Value::Integer(2))]);
        record.insert("a", Value::Integer(10));
        record.insert("c", Value::Integer(3));
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(record.get("a"), Some(&Value::Integer(10)));
    }

    #[test]
    fn project_follows_requested_order_and_skips_missing() {
        let record = Record::from_pairs([("a", 1i64), ("b", 2i64)]);
        let projected = record.project(&["b".to_string(), "zzz".to_string(), "a".to_string()]);
        assert_eq!(projected.columns().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn from_csv_types_columns_and_keeps_header_order() {
        let mut rdr = reader("name,score,flag\nAlice,1.5,true\nBob,,false\n");
        let (table, kinds) = Table::from_csv(&mut rdr).expect("parse");
        assert_eq!(table.columns(), vec!["name", "score", "flag"]);
        assert_eq!(
            kinds,
            vec![ColumnKind::Text, ColumnKind::Float, ColumnKind::Boolean]
        );
        assert_eq!(table.rows()[1].get("score"), Some(&Value::Null));
        assert_eq!(table.rows()[0].get("flag"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn from_csv_with_header_only_yields_empty_table() {
        let mut rdr = reader("a,b\n");
        let (table, kinds) = Table::from_csv(&mut rdr).expect("parse");
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
        assert_eq!(kinds.len(), 2);
    }

    #[test]
    fn serializes_records_as_ordered_objects() {
        let table = Table::new(vec![Record::from_pairs([
            ("z", Value::Integer(1)),
            ("a", Value::Null),
        ])]);
        let json = serde_json::to_string(&table).expect("json");
        assert_eq!(json, r#"[{"z":1,"a":null}]"#);
    }
}
