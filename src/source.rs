//! Data sources and the loader that turns a raw file into a cleaned dataset.

use std::{fmt, fs, path::Path};

use encoding_rs::{Encoding, ISO_8859_15_INIT, UTF_8_INIT, WINDOWS_1252_INIT};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    cleaning,
    data::raw_cell,
    dataset::TabularDataset,
    error::SourceError,
    io_utils,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Stores,
    Sales,
    Products,
    ExchangeRates,
    Customers,
}

static UTF8_ONLY: [&Encoding; 1] = [&UTF_8_INIT];
// The `iso-8859-1` label resolves to windows-1252 in encoding_rs, so the
// regional fallbacks are windows-1252 and Latin-9.
static CUSTOMER_ENCODINGS: [&Encoding; 3] = [&UTF_8_INIT, &WINDOWS_1252_INIT, &ISO_8859_15_INIT];

impl DataSource {
    /// Every source, in ingestion order.
    pub const ALL: [DataSource; 5] = [
        DataSource::Stores,
        DataSource::Sales,
        DataSource::Products,
        DataSource::ExchangeRates,
        DataSource::Customers,
    ];

    /// Name of the store table holding this source.
    pub fn table_name(&self) -> &'static str {
        match self {
            DataSource::Stores => "Stores",
            DataSource::Sales => "Sales",
            DataSource::Products => "Products",
            DataSource::ExchangeRates => "Exchange_Rates",
            DataSource::Customers => "Customers",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            DataSource::Stores => "Stores.csv",
            DataSource::Sales => "Sales.csv",
            DataSource::Products => "Products.csv",
            DataSource::ExchangeRates => "Exchange_Rates.csv",
            DataSource::Customers => "Customers.csv",
        }
    }

    /// Candidate encodings, tried in order.
    pub fn encodings(&self) -> &'static [&'static Encoding] {
        match self {
            DataSource::Customers => &CUSTOMER_ENCODINGS,
            DataSource::Stores
            | DataSource::Sales
            | DataSource::Products
            | DataSource::ExchangeRates => &UTF8_ONLY,
        }
    }

    pub fn clean(&self, raw: &TabularDataset) -> Result<TabularDataset, SourceError> {
        cleaning::clean(*self, raw)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Reads `path` and returns the cleaned dataset for `source`.
pub fn load(source: DataSource, path: &Path) -> Result<TabularDataset, SourceError> {
    info!("Loading {} data from {:?}", source, path);
    let bytes = fs::read(path).map_err(|cause| SourceError::Read {
        source_id: source,
        path: path.to_path_buf(),
        cause,
    })?;
    load_bytes(source, &bytes, io_utils::resolve_input_delimiter(path))
}

/// Decodes and parses `bytes`, then applies the cleaning strategy of `source`.
pub fn load_bytes(
    source: DataSource,
    bytes: &[u8],
    delimiter: u8,
) -> Result<TabularDataset, SourceError> {
    let raw = read_raw(source, bytes, delimiter)?;
    source.clean(&raw)
}

/// Decodes and parses `bytes` into a raw dataset of string cells.
pub fn read_raw(
    source: DataSource,
    bytes: &[u8],
    delimiter: u8,
) -> Result<TabularDataset, SourceError> {
    let candidates = source.encodings();
    let decoded =
        io_utils::decode_with_fallback(bytes, candidates).ok_or_else(|| SourceError::Decode {
            source_id: source,
            tried: candidates.iter().map(|encoding| encoding.name()).collect(),
        })?;
    if decoded.attempts > 1 {
        warn!(
            "{} data decoded as {} after {} attempt(s)",
            source,
            decoded.encoding.name(),
            decoded.attempts
        );
    }
    parse_delimited(source, &decoded.text, delimiter)
}

fn parse_delimited(
    source: DataSource,
    text: &str,
    delimiter: u8,
) -> Result<TabularDataset, SourceError> {
    let malformed = |message: String| SourceError::Malformed {
        source_id: source,
        message,
    };
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter);
    let headers = reader
        .headers()
        .map_err(|err| malformed(format!("Reading header row: {err}")))?
        .iter()
        .map(|header| header.trim().to_string())
        .collect::<Vec<_>>();
    if headers.iter().all(String::is_empty) {
        return Err(malformed("No header row found".to_string()));
    }

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record =
            record.map_err(|err| malformed(format!("Reading row {}: {err}", row_idx + 2)))?;
        if record.len() > headers.len() {
            return Err(malformed(format!(
                "Row {} has {} field(s) but the header has {}",
                row_idx + 2,
                record.len(),
                headers.len()
            )));
        }
        rows.push(record.iter().map(raw_cell).collect::<Vec<_>>());
    }
    Ok(TabularDataset::from_rows(&headers, rows))
}
