//! # LPP Training Pipeline
//!
//! Turns scraped laptop listings into the artifact bundle served by `lpp-api`:
//! ingest raw CSV exports, clean them, extract features from the titles, write
//! the training table, fit the price model and save the artifacts.

pub mod cleaning;
pub mod dataset;
pub mod error;
pub mod extraction;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod price;
pub mod train;

pub use dataset::{read_table, write_table, TrainingRow};
pub use error::{Result, TrainError};
pub use pipeline::{extract_table, fit_from_table, ExtractSummary};
