use std::cmp::Ordering;

use anyhow::{Result, anyhow, bail};

use crate::{
    data::Value,
    dataset::{Record, Table},
    error::DashboardError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    StartsWith,
    EndsWith,
    Between,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub column: String,
    pub operator: ComparisonOperator,
    pub raw_value: String,
    /// Upper bound for [`ComparisonOperator::Between`].
    pub raw_upper: Option<String>,
}

/// Parses brush expressions such as `score >= 10`, `label contains steel` or
/// `score in 2..8` (inclusive). All conditions must hold for a row to match.
pub fn parse_filters(filters: &[String]) -> Result<Vec<FilterCondition>> {
    filters.iter().map(|f| parse_filter(f)).collect()
}

fn parse_filter(filter: &str) -> Result<FilterCondition> {
    let trimmed = filter.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Empty brush expression"));
    }

    let lowered = trimmed.to_ascii_lowercase();
    if let Some(idx) = lowered.rfind(" in ") {
        let range = trimmed[idx + 4..].trim();
        if let Some((lower, upper)) = range.split_once("..") {
            return Ok(FilterCondition {
                column: trimmed[..idx].trim().to_string(),
                operator: ComparisonOperator::Between,
                raw_value: unquote(lower.trim()).to_string(),
                raw_upper: Some(unquote(upper.trim()).to_string()),
            });
        }
    }

    for (needle, op) in [
        (" contains ", ComparisonOperator::Contains),
        (" startswith ", ComparisonOperator::StartsWith),
        (" endswith ", ComparisonOperator::EndsWith),
    ] {
        if let Some(idx) = lowered.find(needle) {
            let (left, right_with_space) = trimmed.split_at(idx);
            let right = right_with_space[needle.len()..].trim();
            return Ok(FilterCondition {
                column: left.trim().to_string(),
                operator: op,
                raw_value: unquote(right).to_string(),
                raw_upper: None,
            });
        }
    }

    for needle in ["!=", ">=", "<=", "=", ">", "<"] {
        if let Some(idx) = trimmed.find(needle) {
            let op = match needle {
                "=" => ComparisonOperator::Eq,
                "!=" => ComparisonOperator::NotEq,
                ">" => ComparisonOperator::Gt,
                ">=" => ComparisonOperator::Ge,
                "<" => ComparisonOperator::Lt,
                "<=" => ComparisonOperator::Le,
                _ => unreachable!(),
            };
            let left = trimmed[..idx].trim();
            let right = trimmed[idx + needle.len()..].trim();
            return Ok(FilterCondition {
                column: left.to_string(),
                operator: op,
                raw_value: unquote(right).to_string(),
                raw_upper: None,
            });
        }
    }

    Err(anyhow!("Failed to parse brush expression '{trimmed}'"))
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Rows of `table` satisfying every condition, in table order.
pub fn apply_filters(table: &Table, conditions: &[FilterCondition]) -> Result<Table> {
    for condition in conditions {
        if !table.is_empty() && !table.has_column(&condition.column) {
            return Err(DashboardError::UnknownColumn(condition.column.clone()).into());
        }
    }
    let mut selected = Table::empty();
    for record in table {
        if evaluate_conditions(conditions, record)? {
            selected.push(record.clone());
        }
    }
    Ok(selected)
}

pub fn evaluate_conditions(conditions: &[FilterCondition], record: &Record) -> Result<bool> {
    for condition in conditions {
        let value = record.get(&condition.column).unwrap_or(&Value::Null);
        if !evaluate_condition(condition, value)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn evaluate_condition(condition: &FilterCondition, value: &Value) -> Result<bool> {
    use ComparisonOperator::*;
    match condition.operator {
        Contains | StartsWith | EndsWith => {
            let text = value.as_display();
            let needle = condition.raw_value.as_str();
            Ok(match condition.operator {
                Contains => text.contains(needle),
                StartsWith => text.starts_with(needle),
                EndsWith => text.ends_with(needle),
                _ => unreachable!(),
            })
        }
        Between => {
            let upper = condition.raw_upper.as_deref().unwrap_or_default();
            if value.is_null() {
                return Ok(false);
            }
            let above = compare(value, &condition.raw_value)?.is_some_and(|o| o != Ordering::Less);
            let below = compare(value, upper)?.is_some_and(|o| o != Ordering::Greater);
            Ok(above && below)
        }
        Eq | NotEq | Gt | Ge | Lt | Le => {
            let rhs_empty = condition.raw_value.is_empty();
            match (value.is_null(), rhs_empty) {
                (true, true) => return Ok(matches!(condition.operator, Eq | Ge | Le)),
                (true, false) | (false, true) => return Ok(matches!(condition.operator, NotEq)),
                (false, false) => {}
            }
            let Some(ordering) = compare(value, &condition.raw_value)? else {
                return Ok(matches!(condition.operator, NotEq));
            };
            Ok(match condition.operator {
                Eq => ordering == Ordering::Equal,
                NotEq => ordering != Ordering::Equal,
                Gt => ordering == Ordering::Greater,
                Ge => ordering != Ordering::Less,
                Lt => ordering == Ordering::Less,
                Le => ordering != Ordering::Greater,
                _ => unreachable!(),
            })
        }
    }
}

/// Compares a cell with a textual bound using the cell's own type.
/// `None` means the two are not comparable (e.g. `true` against `abc`).
fn compare(value: &Value, raw: &str) -> Result<Option<Ordering>> {
    match value {
        Value::Integer(_) | Value::Float(_) => {
            let bound: f64 = raw
                .trim()
                .parse()
                .map_err(|_| anyhow!("Brush bound '{raw}' is not a number"))?;
            let lhs = value.as_f64().unwrap_or_default();
            Ok(lhs.partial_cmp(&bound))
        }
        Value::Boolean(b) => {
            let bound = match raw.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => return Ok(None),
            };
            Ok(Some(b.cmp(&bound)))
        }
        Value::String(s) => Ok(Some(s.as_str().cmp(raw))),
        Value::Null => bail!("Null cells cannot be ordered"),
    }
}
