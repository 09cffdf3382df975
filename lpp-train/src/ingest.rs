//! Raw listing ingestion
//!
//! Reads scraped marketplace CSV exports. Header names are matched without
//! regard to case, with English and Turkish aliases; only the title and price
//! columns are required. Rows without a title or with an unreadable price
//! are dropped and counted.

use std::path::{Path, PathBuf};

use csv::StringRecord;
use lpp_common::features::{normalize_ram, normalize_storage};
use tracing::{debug, info};

use crate::error::{Result, TrainError};
use crate::price::parse_price;

/// One scraped listing, as read from a raw export
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing {
    pub title: String,
    pub price: f64,
    pub brand: Option<String>,
    pub cpu: Option<String>,
    pub gpu: Option<String>,
    pub ram_gb: Option<f64>,
    pub storage_gb: Option<f64>,
}

/// Hint columns carried by at least one input file
///
/// Once a column exists, cleaning treats an empty cell in it as a missing
/// value, even for rows that came from a file without that column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HintColumns {
    pub cpu: bool,
    pub ram: bool,
    pub storage: bool,
}

impl HintColumns {
    fn merge(&mut self, other: HintColumns) {
        self.cpu |= other.cpu;
        self.ram |= other.ram;
        self.storage |= other.storage;
    }
}

/// Listings read from one or more files
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub listings: Vec<RawListing>,
    pub columns: HintColumns,
    /// Rows without a title or a readable price
    pub dropped: usize,
}

const TITLE: &[&str] = &["title", "urun_adi"];
const PRICE: &[&str] = &["price", "fiyat"];
const BRAND: &[&str] = &["brand", "marka"];
const CPU: &[&str] = &["cpu", "islemci"];
const GPU: &[&str] = &["gpu", "ekran_karti"];
const RAM: &[&str] = &["ram_gb"];
const STORAGE: &[&str] = &["storage_gb", "ssd_gb"];

/// Header cell → lookup key: trimmed, lower-cased, BOM and the combining dot
/// of a lower-cased Turkish `İ` removed
pub(crate) fn header_key(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .replace('\u{307}', "")
}

/// Index of the first header matching any alias
pub(crate) fn find_column(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    let keys: Vec<String> = headers.iter().map(header_key).collect();
    aliases
        .iter()
        .find_map(|alias| keys.iter().position(|key| key == alias))
}

fn text_cell(record: &StringRecord, column: Option<usize>) -> Option<String> {
    column
        .and_then(|index| record.get(index))
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// A size hint such as "16", "16.0" or "1 TB"
fn size_cell(
    record: &StringRecord,
    column: Option<usize>,
    normalize: fn(&str) -> Option<u32>,
) -> Option<f64> {
    let text = text_cell(record, column)?;
    match text.replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => normalize(&text).map(f64::from),
    }
}

/// Read one raw listing export
pub fn read_raw_listings(path: &Path, delimiter: u8) -> Result<Ingested> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|e| TrainError::csv(path, e))?;

    let headers = reader.headers().map_err(|e| TrainError::csv(path, e))?.clone();
    let missing = |column: &'static str| TrainError::MissingColumn {
        path: path.to_path_buf(),
        column,
    };
    let title_col = find_column(&headers, TITLE).ok_or_else(|| missing("title"))?;
    let price_col = find_column(&headers, PRICE).ok_or_else(|| missing("price"))?;
    let brand_col = find_column(&headers, BRAND);
    let cpu_col = find_column(&headers, CPU);
    let gpu_col = find_column(&headers, GPU);
    let ram_col = find_column(&headers, RAM);
    let storage_col = find_column(&headers, STORAGE);

    let mut ingested = Ingested {
        columns: HintColumns {
            cpu: cpu_col.is_some(),
            ram: ram_col.is_some(),
            storage: storage_col.is_some(),
        },
        ..Default::default()
    };
    for record in reader.records() {
        let record = record.map_err(|e| TrainError::csv(path, e))?;

        let title = text_cell(&record, Some(title_col));
        let price = text_cell(&record, Some(price_col)).and_then(|text| parse_price(&text));
        let (Some(title), Some(price)) = (title, price) else {
            ingested.dropped += 1;
            continue;
        };

        ingested.listings.push(RawListing {
            title,
            price,
            brand: text_cell(&record, brand_col),
            cpu: text_cell(&record, cpu_col),
            gpu: text_cell(&record, gpu_col),
            ram_gb: size_cell(&record, ram_col, normalize_ram),
            storage_gb: size_cell(&record, storage_col, normalize_storage),
        });
    }

    debug!(
        "{}: {} listings, {} dropped",
        path.display(),
        ingested.listings.len(),
        ingested.dropped
    );
    Ok(ingested)
}

/// Read and concatenate several exports, in the given order
pub fn read_all(paths: &[PathBuf], delimiter: u8) -> Result<Ingested> {
    if paths.is_empty() {
        return Err(TrainError::NoInput);
    }

    let mut merged = Ingested::default();
    for path in paths {
        let ingested = read_raw_listings(path, delimiter)?;
        merged.listings.extend(ingested.listings);
        merged.columns.merge(ingested.columns);
        merged.dropped += ingested.dropped;
    }

    info!(
        "Ingested {} listings from {} file(s) ({} rows without title or price dropped)",
        merged.listings.len(),
        paths.len(),
        merged.dropped
    );
    Ok(merged)
}
