//! Title extraction and the critical-field filter
//!
//! Every table field comes from the listing title. Marketplace hint columns
//! are only used by cleaning; a title that does not mention the CPU, RAM or
//! storage does not make it into the table.

use lpp_common::features::{extract_features, is_unresolved, normalize};
use tracing::info;

use crate::dataset::TrainingRow;
use crate::ingest::RawListing;

/// Extract and normalize one listing
pub fn to_training_row(listing: &RawListing) -> TrainingRow {
    let extracted = extract_features(&listing.title);
    let normalized = normalize(&extracted);
    TrainingRow {
        brand: extracted.brand,
        model: extracted.model,
        cpu: extracted.cpu,
        ram_gb: normalized.ram_gb,
        storage_gb: normalized.storage_gb,
        gpu: extracted.gpu,
        price: Some(listing.price),
    }
}

/// RAM, CPU and storage resolved, price positive
pub fn has_critical_fields(row: &TrainingRow) -> bool {
    row.ram_gb.is_some()
        && row.storage_gb.is_some()
        && !is_unresolved(&row.cpu)
        && row.price.is_some_and(|price| price > 0.0)
}

/// Extract every listing and drop rows missing a critical field
pub fn extract_rows(listings: &[RawListing]) -> Vec<TrainingRow> {
    let rows: Vec<TrainingRow> = listings
        .iter()
        .map(to_training_row)
        .filter(has_critical_fields)
        .collect();

    info!(
        "Extraction: {} of {} listings have RAM, CPU and storage ({} dropped)",
        rows.len(),
        listings.len(),
        listings.len() - rows.len()
    );
    rows
}
