//! End-to-end stages
//!
//! - [`extract_table`]: raw exports → training table
//! - [`fit_from_table`]: training table → artifact bundle on disk

use std::path::{Path, PathBuf};

use lpp_common::config::{CleaningConfig, TrainingConfig};
use lpp_common::ArtifactBundle;
use tracing::info;

use crate::cleaning::{clean, CleaningReport};
use crate::dataset::{read_table, write_table};
use crate::error::{Result, TrainError};
use crate::extraction::extract_rows;
use crate::ingest::read_all;
use crate::train::train;

/// Row counts of one extraction run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractSummary {
    pub ingested: usize,
    pub unparseable: usize,
    pub cleaning: CleaningReport,
    pub written: usize,
}

/// Ingest, clean and extract raw exports into a training table
pub fn extract_table(
    inputs: &[PathBuf],
    output: &Path,
    cleaning: &CleaningConfig,
    delimiter: u8,
) -> Result<ExtractSummary> {
    let ingested = read_all(inputs, delimiter)?;
    let ingested_count = ingested.listings.len();

    let (listings, report) = clean(ingested.listings, &ingested.columns, cleaning);
    if listings.is_empty() {
        return Err(TrainError::NoUsableRows { stage: "cleaning" });
    }

    let rows = extract_rows(&listings);
    if rows.is_empty() {
        return Err(TrainError::NoUsableRows { stage: "extraction" });
    }
    write_table(output, &rows)?;

    Ok(ExtractSummary {
        ingested: ingested_count,
        unparseable: ingested.dropped,
        cleaning: report,
        written: rows.len(),
    })
}

/// Train on a table and save the bundle
pub fn fit_from_table(
    table: &Path,
    artifacts_dir: &Path,
    training: &TrainingConfig,
) -> Result<ArtifactBundle> {
    let rows = read_table(table)?;
    let bundle = train(&rows, training)?;
    bundle.save(artifacts_dir)?;
    info!(
        "Run {} ({}) complete",
        bundle.run_id(),
        bundle.model_version()
    );
    Ok(bundle)
}
