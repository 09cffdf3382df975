//! Error types for lpp-train

use std::path::PathBuf;
use thiserror::Error;

/// Result type for the training pipeline
pub type Result<T> = std::result::Result<T, TrainError>;

/// Training pipeline errors
#[derive(Debug, Error)]
pub enum TrainError {
    /// A CSV file could not be opened, read or written
    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// lpp-common error
    #[error("Common error: {0}")]
    Common(#[from] lpp_common::Error),

    /// A required column is absent from a header row
    #[error("{}: missing required column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    /// No input files were given
    #[error("No input files given")]
    NoInput,

    /// Every row was dropped by some stage
    #[error("No usable rows left after {stage}")]
    NoUsableRows { stage: &'static str },
}

impl TrainError {
    pub(crate) fn csv(path: &std::path::Path, source: csv::Error) -> Self {
        TrainError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}
