//! # LPP Common Library
//!
//! Shared code for the laptop price predictor, used identically by the
//! training pipeline (`lpp-train`) and the inference service (`lpp-api`):
//! - Title feature extraction, numeric normalization and classification
//! - Category encoding (fit once, read-only afterwards)
//! - The fixed 7-field feature vector
//! - The price model and the persisted artifact bundle
//! - Configuration loading

pub mod artifacts;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod model;
pub mod vector;

pub use artifacts::{ArtifactBundle, Prediction, SplitMetrics, TrainingMetrics};
pub use config::{load_config, FeatureDefaults, LoadedConfig, TomlConfig};
pub use encoder::{CategoryEncoding, CategoryEncodings, UNKNOWN_CODE};
pub use error::{Error, Result};
pub use features::{derive_listing_features, ListingFeatures};
pub use model::{BoostingParams, GradientBoostingRegressor, PriceModel};
pub use vector::{EncodedFeatureVector, FEATURE_NAMES};
