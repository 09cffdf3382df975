//! Training table
//!
//! Semicolon-separated, one row per listing:
//!
//! ```text
//! Brand;Model;CPU;RAM;Storage;GPU;Price
//! Asus;TUF Gaming F15;Intel Core i7-12700H;16 GB;512 GB;RTX 3060;42.999,00
//! ```
//!
//! Unresolved cells hold `-`. Prices use the Turkish number format. The reader
//! also accepts the Turkish column names of older tables.

use std::path::Path;

use lpp_common::features::{is_unresolved, normalize_ram, normalize_storage, UNRESOLVED};
use tracing::info;

use crate::error::{Result, TrainError};
use crate::ingest::find_column;
use crate::price::{format_locale_price, parse_locale_price};

/// Column names written by [`write_table`]
pub const TABLE_HEADER: [&str; 7] = ["Brand", "Model", "CPU", "RAM", "Storage", "GPU", "Price"];

/// Table delimiter
pub const TABLE_DELIMITER: u8 = b';';

const BRAND: &[&str] = &["brand", "marka"];
const MODEL: &[&str] = &["model"];
const CPU: &[&str] = &["cpu", "işlemci", "islemci"];
const RAM: &[&str] = &["ram"];
const STORAGE: &[&str] = &["storage", "depolama"];
const GPU: &[&str] = &["gpu", "ekran kartı", "ekran_kartı", "ekran_karti"];
const PRICE: &[&str] = &["price", "fiyat"];

/// One row of the training table
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub brand: String,
    pub model: String,
    pub cpu: String,
    pub ram_gb: Option<u32>,
    pub storage_gb: Option<u32>,
    pub gpu: String,
    pub price: Option<f64>,
}

impl TrainingRow {
    /// Every field the model needs is present
    pub fn is_complete(&self) -> bool {
        self.ram_gb.is_some()
            && self.storage_gb.is_some()
            && !is_unresolved(&self.cpu)
            && !is_unresolved(&self.gpu)
            && self.price.is_some_and(|price| price.is_finite() && price > 0.0)
    }
}

fn size_text(size: Option<u32>) -> String {
    size.map_or_else(|| UNRESOLVED.to_string(), |gb| format!("{gb} GB"))
}

/// Write the table, replacing any existing file
pub fn write_table(path: &Path, rows: &[TrainingRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(TABLE_DELIMITER)
        .from_path(path)
        .map_err(|e| TrainError::csv(path, e))?;

    writer
        .write_record(TABLE_HEADER)
        .map_err(|e| TrainError::csv(path, e))?;
    for row in rows {
        let ram = size_text(row.ram_gb);
        let storage = size_text(row.storage_gb);
        let price = row
            .price
            .map_or_else(|| UNRESOLVED.to_string(), format_locale_price);
        writer
            .write_record([
                row.brand.as_str(),
                row.model.as_str(),
                row.cpu.as_str(),
                ram.as_str(),
                storage.as_str(),
                row.gpu.as_str(),
                price.as_str(),
            ])
            .map_err(|e| TrainError::csv(path, e))?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Read a training table
///
/// Brand and model columns are optional; the others are required. Cells are
/// trimmed and read leniently; a cell that cannot be read becomes `None` or
/// `-` rather than an error.
pub fn read_table(path: &Path) -> Result<Vec<TrainingRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(TABLE_DELIMITER)
        .flexible(true)
        .from_path(path)
        .map_err(|e| TrainError::csv(path, e))?;

    let headers = reader.headers().map_err(|e| TrainError::csv(path, e))?.clone();
    let required = |aliases: &[&str], column: &'static str| {
        find_column(&headers, aliases).ok_or_else(|| TrainError::MissingColumn {
            path: path.to_path_buf(),
            column,
        })
    };
    let cpu_col = required(CPU, "CPU")?;
    let ram_col = required(RAM, "RAM")?;
    let storage_col = required(STORAGE, "Storage")?;
    let gpu_col = required(GPU, "GPU")?;
    let price_col = required(PRICE, "Price")?;
    let brand_col = find_column(&headers, BRAND);
    let model_col = find_column(&headers, MODEL);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| TrainError::csv(path, e))?;
        let cell = |column: Option<usize>| {
            column
                .and_then(|index| record.get(index))
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .unwrap_or(UNRESOLVED)
                .to_string()
        };

        let price_text = cell(Some(price_col));
        let price = if is_unresolved(&price_text) {
            None
        } else {
            parse_locale_price(&price_text)
        };

        rows.push(TrainingRow {
            brand: cell(brand_col),
            model: cell(model_col),
            cpu: cell(Some(cpu_col)),
            ram_gb: normalize_ram(&cell(Some(ram_col))),
            storage_gb: normalize_storage(&cell(Some(storage_col))),
            gpu: cell(Some(gpu_col)),
            price,
        });
    }

    info!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}
