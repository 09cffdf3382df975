//! Trained artifact bundle
//!
//! A training run writes two JSON files into the artifacts directory:
//! - [`MODEL_FILE`]: the fitted model plus run metadata and metrics
//! - [`ENCODINGS_FILE`]: the three category encodings
//!
//! Both carry the same run id. They are only ever used as a pair: the
//! inference service loads them together at startup and refuses to start if
//! either one is missing or unreadable, the model was built for a different
//! feature layout, or the two files come from different runs.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::encoder::CategoryEncodings;
use crate::error::{Error, Result};
use crate::features::ListingFeatures;
use crate::model::{GradientBoostingRegressor, PriceModel};
use crate::vector::{EncodedFeatureVector, FEATURE_NAMES};

pub const MODEL_FILE: &str = "price_model.json";
pub const ENCODINGS_FILE: &str = "category_encodings.json";

/// Error measures on one data split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitMetrics {
    pub rows: usize,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// Importance of one model input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Evaluation recorded at training time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub train: SplitMetrics,
    /// `None` when the run used no hold-out split
    pub test: Option<SplitMetrics>,
    /// Sorted by importance, highest first
    pub feature_importances: Vec<FeatureImportance>,
}

/// Contents of [`MODEL_FILE`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub run_id: Uuid,
    pub model_version: String,
    pub trained_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub metrics: TrainingMetrics,
    pub model: GradientBoostingRegressor,
}

/// Contents of [`ENCODINGS_FILE`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingsArtifact {
    pub run_id: Uuid,
    pub encodings: CategoryEncodings,
}

/// One prediction with the vector it was made from
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Raw model output, not clamped or rounded
    pub price: f64,
    pub vector: EncodedFeatureVector,
    /// Categorical fields that fell back to the unknown code
    pub fallbacks: Vec<&'static str>,
}

/// Model and encodings of one training run
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBundle {
    model: ModelArtifact,
    encodings: EncodingsArtifact,
}

impl ArtifactBundle {
    /// Bundle a freshly trained model, stamped with a new run id and the
    /// current time
    pub fn new(
        model_version: impl Into<String>,
        model: GradientBoostingRegressor,
        encodings: CategoryEncodings,
        metrics: TrainingMetrics,
    ) -> Self {
        let run_id = Uuid::new_v4();
        Self {
            model: ModelArtifact {
                run_id,
                model_version: model_version.into(),
                trained_at: Utc::now(),
                feature_names: FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
                metrics,
                model,
            },
            encodings: EncodingsArtifact { run_id, encodings },
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.model.run_id
    }

    pub fn model_version(&self) -> &str {
        &self.model.model_version
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.model.trained_at
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.model.metrics
    }

    pub fn model(&self) -> &GradientBoostingRegressor {
        &self.model.model
    }

    pub fn encodings(&self) -> &CategoryEncodings {
        &self.encodings.encodings
    }

    /// Encode one listing and run the model on it
    pub fn predict(&self, features: &ListingFeatures) -> Prediction {
        let (vector, fallbacks) = self.encodings().encode(features);
        let price = self.model.model.predict(&vector);
        Prediction {
            price,
            vector,
            fallbacks,
        }
    }

    /// Write both files into `dir`, creating it if needed
    ///
    /// Both files are fully written under a temporary name before either
    /// replaces its predecessor.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let model_path = dir.join(MODEL_FILE);
        let encodings_path = dir.join(ENCODINGS_FILE);

        let model_tmp = stage_json(&model_path, &self.model)?;
        let encodings_tmp = match stage_json(&encodings_path, &self.encodings) {
            Ok(tmp) => tmp,
            Err(e) => {
                warn!("Encodings write failed, discarding staged model: {}", e);
                let _ = fs::remove_file(&model_tmp);
                return Err(e);
            }
        };
        fs::rename(&encodings_tmp, &encodings_path)?;
        fs::rename(&model_tmp, &model_path)?;
        info!(
            "Saved artifacts for run {} to {}",
            self.model.run_id,
            dir.display()
        );
        Ok(())
    }

    /// Load and check both files from `dir`
    ///
    /// # Errors
    /// - [`Error::ArtifactMissing`] naming the file that does not exist
    /// - [`Error::ArtifactCorrupt`] for undecodable or inconsistent content
    /// - [`Error::ArtifactIncompatible`] for a model trained on a different
    ///   feature layout, or model and encodings from different runs
    pub fn load(dir: &Path) -> Result<Self> {
        let model_path = dir.join(MODEL_FILE);
        let encodings_path = dir.join(ENCODINGS_FILE);

        let model: ModelArtifact = read_json(&model_path)?;
        let encodings: EncodingsArtifact = read_json(&encodings_path)?;

        if model.feature_names != FEATURE_NAMES {
            return Err(Error::ArtifactIncompatible {
                path: model_path,
                reason: format!(
                    "model expects features {:?}, this build produces {:?}",
                    model.feature_names, FEATURE_NAMES
                ),
            });
        }
        model.model.validate().map_err(|e| Error::ArtifactCorrupt {
            path: model_path.clone(),
            reason: e.to_string(),
        })?;
        encodings.encodings.validate().map_err(|e| Error::ArtifactCorrupt {
            path: encodings_path.clone(),
            reason: e.to_string(),
        })?;

        if model.run_id != encodings.run_id {
            return Err(Error::ArtifactIncompatible {
                path: encodings_path,
                reason: format!(
                    "encodings belong to run {}, model to run {}",
                    encodings.run_id, model.run_id
                ),
            });
        }

        Ok(Self { model, encodings })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::ArtifactMissing(path.to_path_buf()));
        }
        Err(e) => return Err(Error::Io(e)),
    };
    serde_json::from_str(&content).map_err(|e| Error::ArtifactCorrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Write `value` to `<path>.tmp` and return that path
fn stage_json<T: Serialize>(path: &Path, value: &T) -> Result<PathBuf> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let json = serde_json::to_string_pretty(value)?;
    fs::write(&tmp, json)?;
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::derive_listing_features;
    use crate::model::BoostingParams;
    use tempfile::TempDir;

    fn bundle() -> ArtifactBundle {
        let rows = vec![
            derive_listing_features(8.0, 256.0, "Intel Core i5-1235U", "Intel Iris Xe", "HP"),
            derive_listing_features(16.0, 512.0, "AMD Ryzen 7 7730U", "NVIDIA RTX 3060", "Asus"),
            derive_listing_features(
                32.0,
                1024.0,
                "Intel Core i9-13980HX",
                "NVIDIA RTX 4080",
                "MSI",
            ),
        ];
        let encodings = CategoryEncodings::fit(&rows);
        let vectors: Vec<_> = rows.iter().map(|row| encodings.encode(row).0).collect();
        let params = BoostingParams {
            n_estimators: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            ..Default::default()
        };
        let prices = [20_000.0, 35_000.0, 90_000.0];
        let model = GradientBoostingRegressor::fit(params, &vectors, &prices).unwrap();
        let metrics = TrainingMetrics {
            train: SplitMetrics {
                rows: 3,
                mae: 0.0,
                rmse: 0.0,
                r2: 1.0,
            },
            test: None,
            feature_importances: Vec::new(),
        };
        ArtifactBundle::new("test-v1", model, encodings, metrics)
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let bundle = bundle();
        bundle.save(dir.path()).unwrap();

        assert!(dir.path().join(MODEL_FILE).exists());
        assert!(dir.path().join(ENCODINGS_FILE).exists());
        assert!(!dir.path().join("price_model.json.tmp").exists());

        let loaded = ArtifactBundle::load(dir.path()).unwrap();
        assert_eq!(loaded.run_id(), bundle.run_id());
        assert_eq!(loaded.model_version(), "test-v1");
        assert_eq!(loaded.encodings(), bundle.encodings());
    }

    #[test]
    fn test_missing_file_named() {
        let dir = TempDir::new().unwrap();
        bundle().save(dir.path()).unwrap();
        fs::remove_file(dir.path().join(ENCODINGS_FILE)).unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        match err {
            Error::ArtifactMissing(path) => assert!(path.ends_with(ENCODINGS_FILE)),
            other => panic!("expected ArtifactMissing, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_file() {
        let dir = TempDir::new().unwrap();
        bundle().save(dir.path()).unwrap();
        fs::write(dir.path().join(MODEL_FILE), "{ not json").unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ArtifactCorrupt { .. }));
        assert!(err.to_string().contains(MODEL_FILE));
    }

    #[test]
    fn test_feature_layout_mismatch() {
        let dir = TempDir::new().unwrap();
        let mut bundle = bundle();
        bundle.model.feature_names.swap(0, 1);
        bundle.save(dir.path()).unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ArtifactIncompatible { .. }));
    }

    #[test]
    fn test_encodings_from_other_run_rejected() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        bundle().save(dir.path()).unwrap();
        bundle().save(other.path()).unwrap();
        fs::copy(other.path().join(ENCODINGS_FILE), dir.path().join(ENCODINGS_FILE)).unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        match err {
            Error::ArtifactIncompatible { path, reason } => {
                assert!(path.ends_with(ENCODINGS_FILE));
                assert!(reason.contains("run"), "{reason}");
            }
            other => panic!("expected ArtifactIncompatible, got {other:?}"),
        }
    }

    #[test]
    fn test_save_leaves_no_staging_files() {
        let dir = TempDir::new().unwrap();
        bundle().save(dir.path()).unwrap();
        bundle().save(dir.path()).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2, "{names:?}");
        assert!(ArtifactBundle::load(dir.path()).is_ok());
    }

    #[test]
    fn test_predict_reports_fallbacks() {
        let bundle = bundle();
        let known = derive_listing_features(
            16.0,
            512.0,
            "AMD Ryzen 7 7730U",
            "NVIDIA RTX 3060",
            "Asus",
        );
        let unseen = derive_listing_features(
            16.0,
            512.0,
            "AMD Ryzen 7 7730U",
            "NVIDIA RTX 3060",
            "Zorin",
        );

        assert!(bundle.predict(&known).fallbacks.is_empty());
        let prediction = bundle.predict(&unseen);
        assert_eq!(prediction.fallbacks, vec!["laptop_brand"]);
        assert_eq!(prediction.vector.laptop_brand_code, 0.0);
        assert!(prediction.price.is_finite());
    }
}
