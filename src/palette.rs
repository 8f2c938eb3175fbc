use itertools::Itertools;

use crate::{data::Value, dataset::Table};

#[derive(Debug, Clone, PartialEq)]
pub enum ColorScale {
    Sequential { min: f64, max: f64 },
    Ordinal { domain: Vec<Value>, scheme: Vec<String> },
}

impl ColorScale {
    pub fn unit() -> Self {
        ColorScale::Sequential { min: 0.0, max: 1.0 }
    }

    /// Picks the scale kind from the first row's value in `column`.
    pub fn for_column(table: &Table, column: &str) -> Self {
        let Some(first) = table.get(0).and_then(|record| record.get(column)) else {
            return Self::unit();
        };
        match first {
            Value::Integer(_) | Value::Float(_) => {
                let (min, max) = table
                    .column_values(column)
                    .filter_map(Value::as_f64)
                    .minmax()
                    .into_option()
                    .unwrap_or((0.0, 1.0));
                ColorScale::Sequential { min, max }
            }
            Value::String(_) => {
                let domain = table
                    .column_values(column)
                    .cloned()
                    .sorted()
                    .dedup()
                    .collect::<Vec<_>>();
                let scheme = turbo_scheme(domain.len());
                ColorScale::Ordinal { domain, scheme }
            }
            _ => Self::unit(),
        }
    }

    /// `#rrggbb` for `value`, or `None` when the scale cannot place it.
    pub fn color(&self, value: &Value) -> Option<String> {
        match self {
            ColorScale::Sequential { min, max } => {
                let v = value.as_f64()?;
                let span = max - min;
                let t = if span == 0.0 { 0.5 } else { (v - min) / span };
                Some(turbo(t))
            }
            ColorScale::Ordinal { domain, scheme } => {
                let position = domain.binary_search(value).ok()?;
                scheme.get(position).cloned()
            }
        }
    }
}

/// `n` colors sampled evenly from Turbo, first and last at the ends.
pub fn turbo_scheme(n: usize) -> Vec<String> {
    match n {
        0 => Vec::new(),
        1 => vec![turbo(0.5)],
        _ => (0..n)
            .map(|i| turbo(i as f64 / (n - 1) as f64))
            .collect(),
    }
}

/// Polynomial approximation of the Turbo colormap for `t` in `[0, 1]`.
pub fn turbo(t: f64) -> String {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let channel = |c: f64| c.round().clamp(0.0, 255.0) as u8;
    let r = channel(
        34.61 + t * (1172.33 - t * (10793.56 - t * (33300.12 - t * (38394.49 - t * 14825.05)))),
    );
    let g = channel(23.31 + t * (557.33 + t * (1225.33 - t * (3574.96 - t * (1073.77 + t * 707.56)))));
    let b = channel(
        27.2 + t * (3211.1 - t * (15327.97 - t * (27814.0 - t * (22569.18 - t * 6838.66)))),
    );
    format!("#{r:02x}{g:02x}{b:02x}")
}
