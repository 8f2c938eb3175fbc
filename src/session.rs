use log::{debug, info, warn};

use crate::{
    config::Config,
    data::Value,
    dataset::{Record, Table},
    error::DashboardError,
    filter::{self, FilterCondition},
    palette::ColorScale,
    summary::{self, Summary},
    truncate::{ID_COLUMN, TruncationIndex},
};

#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
    data: Table,
    selected_columns: Vec<String>,
    color_column: Option<String>,
    baseline: Option<Record>,
}

/// Everything a redraw produces: chart rows, grid rows and the color scale.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// Truncated rows fed to the chart, each carrying an `id`.
    pub chart: Table,
    /// Original rows shown in the grid, each carrying an `id`.
    pub grid: Table,
    pub axes: Vec<String>,
    pub color_column: Option<String>,
    pub color: ColorScale,
    /// One color per chart row (scale built from chart values), `None` where
    /// the scale cannot place a value.
    pub row_colors: Vec<Option<String>>,
}

impl View {
    pub fn is_empty(&self) -> bool {
        self.chart.is_empty()
    }

    fn empty(color_column: Option<String>) -> Self {
        Self {
            chart: Table::empty(),
            grid: Table::empty(),
            axes: Vec::new(),
            color_column,
            color: ColorScale::unit(),
            row_colors: Vec::new(),
        }
    }
}

/// Result of a brush gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct Brushed {
    /// Matching chart rows, still truncated.
    pub display: Table,
    /// The same rows with original values restored for the grid.
    pub grid: Table,
    pub active: bool,
}

impl Session {
    pub fn new(data: Table, config: Config) -> Self {
        let mut session = Self {
            config,
            data,
            selected_columns: Vec::new(),
            color_column: None,
            baseline: None,
        };
        session.reset_to_default();
        session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn data(&self) -> &Table {
        &self.data
    }

    pub fn selected_columns(&self) -> &[String] {
        &self.selected_columns
    }

    pub fn color_column(&self) -> Option<&str> {
        self.color_column.as_deref()
    }

    pub fn baseline(&self) -> Option<&Record> {
        self.baseline.as_ref()
    }

    pub fn default_columns(&self) -> Vec<String> {
        self.data.columns()
    }

    pub fn default_color_column(&self) -> Option<String> {
        let columns = self.data.columns();
        self.config
            .preferred_color_column
            .as_ref()
            .filter(|preferred| columns.contains(preferred))
            .cloned()
            .or_else(|| columns.into_iter().next())
    }

    pub fn reset_to_default(&mut self) {
        self.selected_columns = self.default_columns();
        self.color_column = self.default_color_column();
        self.baseline = None;
        debug!(
            "Reset to {} column(s), color column {:?}",
            self.selected_columns.len(),
            self.color_column
        );
    }

    /// Keeps the requested columns that exist; unknown names are dropped.
    pub fn select_columns(&mut self, columns: &[String]) {
        let available = self.data.columns();
        let (known, unknown): (Vec<String>, Vec<String>) = columns
            .iter()
            .cloned()
            .partition(|column| available.contains(column));
        if !unknown.is_empty() {
            warn!("Ignoring unknown column(s): {}", unknown.join(", "));
        }
        self.selected_columns = known;
    }

    pub fn set_color_column(&mut self, column: &str) -> Result<(), DashboardError> {
        if !self.data.has_column(column) {
            return Err(DashboardError::UnknownColumn(column.to_string()));
        }
        self.color_column = Some(column.to_string());
        Ok(())
    }

    pub fn selection_label(&self) -> String {
        let count = self.selected_columns.len();
        if count == 0 {
            "Nothing is selected".to_string()
        } else if count == self.data.columns().len() {
            "All columns selected".to_string()
        } else if count == 1 {
            "1 column selected".to_string()
        } else {
            format!("{count} columns selected")
        }
    }

    /// Selected columns of every row, minus rows excluded by the zero rule.
    pub fn columns_to_show(&self) -> Table {
        if self.selected_columns.is_empty() {
            return Table::empty();
        }
        let exclude = self.config.exclude_zero_column.as_deref();
        self.data
            .iter()
            .map(|record| record.project(&self.selected_columns))
            .filter(|record| match exclude.and_then(|column| record.get(column)) {
                Some(value) => !is_zero(value),
                None => true,
            })
            .collect()
    }

    /// Rebuilds chart and grid rows for the current selection.
    pub fn render(&self) -> View {
        let rows = self.columns_to_show();
        if rows.is_empty() {
            info!("No data to display for the current selection");
            return View::empty(self.color_column.clone());
        }

        let index = TruncationIndex::build_with_limit(&rows, self.config.text_length);
        let chart = with_row_ids(&index.apply(&rows));
        let grid = with_row_ids(&rows);

        let hidden = &self.config.hidden_axes;
        let axes = rows
            .columns()
            .into_iter()
            .filter(|column| column != ID_COLUMN && !hidden.contains(column))
            .collect::<Vec<_>>();

        let (color, row_colors) = match self.color_column.as_deref() {
            Some(column) => {
                let scale = ColorScale::for_column(&chart, column);
                let colors = chart
                    .iter()
                    .map(|record| record.get(column).and_then(|value| scale.color(value)))
                    .collect();
                (scale, colors)
            }
            None => (ColorScale::unit(), vec![None; rows.len()]),
        };

        info!(
            "Rendered {} row(s) on {} axis/axes",
            chart.len(),
            axes.len()
        );
        View {
            chart,
            grid,
            axes,
            color_column: self.color_column.clone(),
            color,
            row_colors,
        }
    }

    /// Applies brush conditions to the chart rows and restores the matches
    /// for the grid through a fresh index of the grid rows.
    pub fn brush(&self, view: &View, conditions: &[FilterCondition]) -> anyhow::Result<Brushed> {
        let display = filter::apply_filters(&view.chart, conditions)?;
        let index = TruncationIndex::build_with_limit(&view.grid, self.config.text_length);
        let grid = index.invert().restore(&display);
        debug!(
            "Brushed {} of {} row(s) with {} condition(s)",
            display.len(),
            view.chart.len(),
            conditions.len()
        );
        Ok(Brushed {
            display,
            grid,
            active: !conditions.is_empty(),
        })
    }

    pub fn summarize(&self, rows: &Table) -> Option<Summary> {
        summary::summarize(rows, self.data.len(), &self.config.summary_columns)
    }

    /// Marks the grid row with `id` as the baseline. Unknown ids leave the
    /// current baseline in place.
    pub fn set_baseline(&mut self, view: &View, id: i64) -> Option<&Record> {
        let target = Value::Integer(id);
        match view
            .grid
            .iter()
            .find(|record| record.get(ID_COLUMN) == Some(&target))
        {
            Some(record) => {
                self.baseline = Some(record.clone());
                self.baseline.as_ref()
            }
            None => {
                warn!("No row with id {id} to mark as baseline");
                None
            }
        }
    }

    pub fn clear_baseline(&mut self) {
        self.baseline = None;
    }

    /// Chart row to highlight when the pointer is over grid row `id`.
    pub fn highlight<'a>(
        &self,
        view: &'a View,
        brushed: Option<&'a Brushed>,
        id: i64,
    ) -> Option<&'a Record> {
        let visible = match brushed {
            Some(brushed) if brushed.active => &brushed.display,
            _ => &view.chart,
        };
        let target = Value::Integer(id);
        visible
            .iter()
            .find(|record| record.get(ID_COLUMN) == Some(&target))
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Integer(i) => *i == 0,
        Value::Float(f) => *f == 0.0,
        _ => false,
    }
}

/// Gives every row an `id`: its own when truthy, otherwise its position.
fn with_row_ids(table: &Table) -> Table {
    table
        .iter()
        .enumerate()
        .map(|(position, record)| {
            let mut record = record.clone();
            let keep = record.get(ID_COLUMN).is_some_and(Value::is_truthy);
            if !keep {
                record.insert(ID_COLUMN, Value::Integer(position as i64));
            }
            record
        })
        .collect()
}
