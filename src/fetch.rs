use std::{
    fmt,
    io::Read,
    path::{Path, PathBuf},
    time::Duration,
};

use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    data::ColumnKind,
    dataset::Table,
    error::DashboardError,
    io_utils,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl DataSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            DataSource::File(path) => Some(path),
            DataSource::Url(_) => None,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(url) => f.write_str(url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

#[derive(Debug, Clone)]
pub struct LoadedData {
    pub table: Table,
    pub columns: Vec<(String, ColumnKind)>,
}

pub fn load(source: &DataSource, options: LoadOptions) -> Result<LoadedData, DashboardError> {
    info!("Loading dataset from {source}");
    let reader: Box<dyn Read> = match source {
        DataSource::Url(url) => {
            let text = fetch_text(url, options.encoding)?;
            Box::new(std::io::Cursor::new(text.into_bytes()))
        }
        DataSource::File(path) => io_utils::open_decoded_input(path, options.encoding)
            .map_err(|err| DashboardError::Fetch {
                source_name: source.to_string(),
                reason: format!("{err:#}"),
            })?,
    };
    parse_csv(source, reader, options.delimiter)
}

fn fetch_text(url: &str, encoding: &'static Encoding) -> Result<String, DashboardError> {
    let fetch_error = |reason: String| DashboardError::Fetch {
        source_name: url.to_string(),
        reason,
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|err| fetch_error(err.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|err| fetch_error(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("HTTP error! status: {status}")));
    }
    let bytes = response
        .bytes()
        .map_err(|err| fetch_error(err.to_string()))?;
    debug!("Fetched {} byte(s) from {url}", bytes.len());
    io_utils::decode_bytes(&bytes, encoding).map_err(|err| DashboardError::Parse {
        source_name: url.to_string(),
        reason: err.to_string(),
    })
}

fn parse_csv<R: Read>(
    source: &DataSource,
    reader: R,
    delimiter: u8,
) -> Result<LoadedData, DashboardError> {
    let mut csv_reader = io_utils::open_csv_reader(reader, delimiter);
    let (table, kinds) = Table::from_csv(&mut csv_reader).map_err(|err| DashboardError::Parse {
        source_name: source.to_string(),
        reason: format!("{err:#}"),
    })?;
    let headers = csv_reader
        .headers()
        .map_err(|err| DashboardError::Parse {
            source_name: source.to_string(),
            reason: err.to_string(),
        })?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    info!(
        "Loaded {} row(s) across {} column(s) from {source}",
        table.len(),
        headers.len()
    );
    Ok(LoadedData {
        table,
        columns: headers.into_iter().zip(kinds).collect(),
    })
}

/// Parses CSV text that is already in memory.
pub fn load_from_str(text: &str, delimiter: u8) -> Result<LoadedData, DashboardError> {
    let source = DataSource::File(PathBuf::from("<memory>"));
    parse_csv(&source, text.trim_start_matches(io_utils::UTF8_BOM).as_bytes(), delimiter)
}
