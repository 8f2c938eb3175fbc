//! Dashboard configuration loaded from YAML.
//!
//! Every field is optional in the file; missing fields take the defaults
//! below. A typical file:
//!
//! ```yaml
//! endpoint: https://example.org/data.csv
//! text_length: 20
//! hidden_axes: [name]
//! summary_columns: ["EUI (Total) (kWh/m2)"]
//! export:
//!   filtered_file_name: filtered.csv
//! ```

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::truncate::DEFAULT_TEXT_LENGTH;

pub const DEFAULT_COLOR_COLUMN: &str = "Permutation #";
pub const DEFAULT_ALL_FILE_NAME: &str = "dune_all_data.csv";
pub const DEFAULT_FILTERED_FILE_NAME: &str = "dune_filtered_data.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// CSV endpoint used when no source is given on the command line.
    pub endpoint: Option<String>,
    pub text_length: usize,
    /// Color column chosen on load when present; otherwise the first column.
    pub preferred_color_column: Option<String>,
    /// Rows whose value in this column is 0 are dropped before display.
    pub exclude_zero_column: Option<String>,
    pub hidden_axes: Vec<String>,
    /// Columns for the summary panel; empty means every numeric column.
    pub summary_columns: Vec<String>,
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            text_length: DEFAULT_TEXT_LENGTH,
            preferred_color_column: Some(DEFAULT_COLOR_COLUMN.to_string()),
            exclude_zero_column: Some(DEFAULT_COLOR_COLUMN.to_string()),
            hidden_axes: vec!["name".to_string()],
            summary_columns: Vec::new(),
            export: ExportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub all_file_name: String,
    pub filtered_file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            all_file_name: DEFAULT_ALL_FILE_NAME.to_string(),
            filtered_file_name: DEFAULT_FILTERED_FILE_NAME.to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: Config = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text).context("Parsing config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            !self.export.all_file_name.trim().is_empty()
                && !self.export.filtered_file_name.trim().is_empty(),
            "Export file names cannot be empty"
        );
        ensure!(
            self.export.all_file_name != self.export.filtered_file_name,
            "Export file names for all and filtered rows must differ"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_fields() {
        let config = Config::from_yaml_str("text_length: 12\nhidden_axes: []\n").expect("config");
        assert_eq!(config.text_length, 12);
        assert!(config.hidden_axes.is_empty());
        assert_eq!(config.export.all_file_name, DEFAULT_ALL_FILE_NAME);
        assert_eq!(
            config.preferred_color_column.as_deref(),
            Some(DEFAULT_COLOR_COLUMN)
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::from_yaml_str("txt_length: 3\n").is_err());
    }

    #[test]
    fn identical_export_names_are_rejected() {
        let yaml = "export:\n  all_file_name: same.csv\n  filtered_file_name: same.csv\n";
        assert!(Config::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn null_color_column_disables_preference() {
        let config = Config::from_yaml_str("preferred_color_column: null\n").expect("config");
        assert_eq!(config.preferred_color_column, None);
    }
}
