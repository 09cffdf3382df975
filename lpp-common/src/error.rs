//! Common error types for LPP

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for LPP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by training and serving
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model fitting or prediction error
    #[error("Model error: {0}")]
    Model(String),

    /// A trained artifact file does not exist
    #[error("Artifact file not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// A trained artifact file exists but cannot be decoded
    #[error("Artifact file {} is corrupt: {reason}", .path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },

    /// Artifact decoded, but does not match this build's feature layout
    #[error("Artifact file {} is incompatible: {reason}", .path.display())]
    ArtifactIncompatible { path: PathBuf, reason: String },
}
