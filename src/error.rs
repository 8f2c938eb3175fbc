use thiserror::Error;

/// Likely causes shown whenever the dataset cannot be loaded.
pub const FETCH_HINTS: &[&str] = &[
    "The endpoint URL (--url or `endpoint` in the config file) is correct.",
    "The backend serving the CSV is deployed; re-deploy it as a new version after changes.",
    "The sheet or table the backend reads from exists and is named correctly.",
    "The backend adds an `Access-Control-Allow-Origin: *` header to its responses.",
];

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Could not load data from {source_name}: {reason}\n{}", render_hints())]
    Fetch { source_name: String, reason: String },
    #[error("Malformed CSV from {source_name}: {reason}")]
    Parse { source_name: String, reason: String },
    #[error("Column '{0}' not found in the dataset")]
    UnknownColumn(String),
    #[error("No filters are active. Filter the data on an axis first.")]
    NoActiveFilter,
    #[error("No data selected. Filter the data on an axis first.")]
    EmptySelection,
}

impl DashboardError {
    /// Export refusals are warnings for the user, not failures.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            DashboardError::NoActiveFilter | DashboardError::EmptySelection
        )
    }
}

fn render_hints() -> String {
    let mut text = String::from("Please check:");
    for hint in FETCH_HINTS {
        text.push_str("\n  - ");
        text.push_str(hint);
    }
    text
}
