use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Mirrors the loose "truthiness" the dashboard uses for identifiers:
    /// null, `false`, zero and the empty string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::String(s) => s.clone(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) | Value::Float(_) => 2,
            Value::String(_) => 3,
        }
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            // Integers sort ahead of numerically equal floats.
            (Value::Integer(a), Value::Float(b)) => (*a as f64).total_cmp(b).then(Ordering::Less),
            (Value::Float(a), Value::Integer(b)) => {
                a.total_cmp(&(*b as f64)).then(Ordering::Greater)
            }
            (Value::String(a), Value::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnKind::Integer => "Integer",
            ColumnKind::Float => "Float",
            ColumnKind::Boolean => "Boolean",
            ColumnKind::Text => "Text",
        };
        f.write_str(label)
    }
}

pub fn parse_typed_value(raw: &str, kind: ColumnKind) -> Result<Value> {
    if raw.is_empty() || (kind != ColumnKind::Text && raw.trim().is_empty()) {
        return Ok(Value::Null);
    }
    let parsed = match kind {
        ColumnKind::Text => Value::String(raw.to_string()),
        ColumnKind::Integer => {
            let parsed: i64 = raw
                .trim()
                .parse()
                .with_context(|| format!("Failed to parse '{raw}' as integer"))?;
            Value::Integer(parsed)
        }
        ColumnKind::Float => {
            let parsed: f64 = raw
                .trim()
                .parse()
                .with_context(|| format!("Failed to parse '{raw}' as float"))?;
            if !parsed.is_finite() {
                bail!("Failed to parse '{raw}' as a finite float");
            }
            Value::Float(parsed)
        }
        ColumnKind::Boolean => match parse_boolean(raw) {
            Some(b) => Value::Boolean(b),
            None => bail!("Failed to parse '{raw}' as boolean"),
        },
    };
    Ok(parsed)
}

fn parse_boolean(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn looks_like_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    // Leading zeros carry meaning (codes, zip codes) and stay text.
    !(digits.len() > 1 && digits.starts_with('0')) && raw.parse::<i64>().is_ok()
}

fn looks_like_float(raw: &str) -> bool {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    if digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.") {
        return false;
    }
    matches!(raw.parse::<f64>(), Ok(f) if f.is_finite())
        && raw.bytes().any(|b| b.is_ascii_digit())
}

#[derive(Debug, Default, Clone)]
struct KindCandidate {
    non_empty: usize,
    integer_matches: usize,
    float_matches: usize,
    boolean_matches: usize,
}

impl KindCandidate {
    fn update(&mut self, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return;
        }
        self.non_empty += 1;
        if looks_like_integer(trimmed) {
            self.integer_matches += 1;
            self.float_matches += 1;
        } else if looks_like_float(trimmed) {
            self.float_matches += 1;
        } else if parse_boolean(trimmed).is_some() {
            self.boolean_matches += 1;
        }
    }

    fn decide(&self) -> ColumnKind {
        if self.non_empty == 0 {
            ColumnKind::Text
        } else if self.integer_matches == self.non_empty {
            ColumnKind::Integer
        } else if self.float_matches == self.non_empty {
            ColumnKind::Float
        } else if self.boolean_matches == self.non_empty {
            ColumnKind::Boolean
        } else {
            ColumnKind::Text
        }
    }
}

/// Decides one [`ColumnKind`] per column from every row's raw cells.
pub fn infer_column_kinds(column_count: usize, rows: &[Vec<String>]) -> Vec<ColumnKind> {
    let mut candidates = vec![KindCandidate::default(); column_count];
    for row in rows {
        for (candidate, raw) in candidates.iter_mut().zip(row) {
            candidate.update(raw);
        }
    }
    candidates.iter().map(KindCandidate::decide).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn infer_column_kinds_classifies_each_column() {
        let data = rows(&[
            &["1", "1.5", "true", "alpha"],
            &["2", "3", "FALSE", "12"],
            &["", "", "", ""],
        ]);
        let kinds = infer_column_kinds(4, &data);
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Integer,
                ColumnKind::Float,
                ColumnKind::Boolean,
                ColumnKind::Text
            ]
        );
    }

    #[test]
    fn infer_column_kinds_keeps_leading_zero_codes_as_text() {
        let data = rows(&[&["007"], &["12"]]);
        assert_eq!(infer_column_kinds(1, &data), vec![ColumnKind::Text]);
    }

    #[test]
    fn infer_column_kinds_treats_non_finite_numbers_as_text() {
        let data = rows(&[&["NaN"], &["inf"]]);
        assert_eq!(infer_column_kinds(1, &data), vec![ColumnKind::Text]);
    }

    #[test]
    fn empty_column_defaults_to_text() {
        let data = rows(&[&[""], &[""]]);
        assert_eq!(infer_column_kinds(1, &data), vec![ColumnKind::Text]);
    }

    #[test]
    fn parse_typed_value_maps_empty_cells_to_null() {
        assert_eq!(parse_typed_value("", ColumnKind::Integer).unwrap(), Value::Null);
        assert_eq!(parse_typed_value("", ColumnKind::Text).unwrap(), Value::Null);
        assert_eq!(parse_typed_value("  ", ColumnKind::Float).unwrap(), Value::Null);
        assert_eq!(parse_typed_value(" ", ColumnKind::Text).unwrap(), Value::from(" "));
    }

    #[test]
    fn parse_typed_value_rejects_mismatched_input() {
        assert!(parse_typed_value("abc", ColumnKind::Integer).is_err());
        assert!(parse_typed_value("maybe", ColumnKind::Boolean).is_err());
        assert_eq!(
            parse_typed_value("0.25", ColumnKind::Float).unwrap(),
            Value::Float(0.25)
        );
    }

    #[test]
    fn integer_and_float_with_same_magnitude_are_distinct_keys() {
        let mut set = HashSet::new();
        set.insert(Value::Integer(3));
        set.insert(Value::Float(3.0));
        set.insert(Value::String("3".into()));
        assert_eq!(set.len(), 3);
        assert!(Value::Integer(3) < Value::Float(3.0));
    }

    #[test]
    fn ordering_groups_null_booleans_numbers_then_text() {
        let mut values = vec![
            Value::from("b"),
            Value::Float(2.5),
            Value::Null,
            Value::Integer(1),
            Value::Boolean(true),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Boolean(true),
                Value::Integer(1),
                Value::Float(2.5),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn display_drops_integral_float_fraction() {
        assert_eq!(Value::Float(4.0).as_display(), "4");
        assert_eq!(Value::Float(4.25).as_display(), "4.25");
        assert_eq!(Value::Null.as_display(), "");
    }

    #[test]
    fn truthiness_follows_dashboard_rules() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::Integer(7).is_truthy());
    }
}
