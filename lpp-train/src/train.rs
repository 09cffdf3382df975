//! Model fitting
//!
//! Rows missing any model input are dropped. The category encodings are fitted
//! on every remaining row, so the hold-out split never contains a category the
//! encodings have not seen. The model itself only sees the training split.

use lpp_common::artifacts::FeatureImportance;
use lpp_common::config::TrainingConfig;
use lpp_common::{
    derive_listing_features, ArtifactBundle, CategoryEncodings, EncodedFeatureVector,
    GradientBoostingRegressor, ListingFeatures, TrainingMetrics, FEATURE_NAMES,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::dataset::TrainingRow;
use crate::error::{Result, TrainError};
use crate::metrics::evaluate;

/// Listing features and target price of every complete row
pub fn prepare(rows: &[TrainingRow]) -> (Vec<ListingFeatures>, Vec<f64>) {
    rows.iter()
        .filter(|row| row.is_complete())
        .filter_map(|row| {
            let (Some(ram), Some(storage), Some(price)) = (row.ram_gb, row.storage_gb, row.price)
            else {
                return None;
            };
            let features = derive_listing_features(
                f64::from(ram),
                f64::from(storage),
                &row.cpu,
                &row.gpu,
                &row.brand,
            );
            Some((features, price))
        })
        .unzip()
}

/// Row indices of the hold-out and training splits
///
/// The hold-out gets `ceil(n · fraction)` rows but never all of them.
pub fn split_indices(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let n_test = ((n as f64 * test_fraction).ceil() as usize).min(n.saturating_sub(1));
    let train = indices.split_off(n_test);
    (indices, train)
}

fn gather<T: Copy>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&index| values[index]).collect()
}

/// Fit encodings and model on a training table
pub fn train(rows: &[TrainingRow], config: &TrainingConfig) -> Result<ArtifactBundle> {
    let (features, prices) = prepare(rows);
    info!(
        "Training on {} of {} rows ({} missing price, RAM, storage, CPU or GPU)",
        features.len(),
        rows.len(),
        rows.len() - features.len()
    );
    if features.is_empty() {
        return Err(TrainError::NoUsableRows { stage: "dropping incomplete rows" });
    }

    let encodings = CategoryEncodings::fit(&features);
    for (field, encoding) in encodings.iter() {
        info!("Encoding {}: {} categories", field, encoding.len());
    }
    let vectors: Vec<EncodedFeatureVector> =
        features.iter().map(|row| encodings.encode(row).0).collect();

    let (test_idx, train_idx) = split_indices(vectors.len(), config.test_fraction, config.seed);
    let train_x = gather(&vectors, &train_idx);
    let train_y = gather(&prices, &train_idx);
    let test_x = gather(&vectors, &test_idx);
    let test_y = gather(&prices, &test_idx);

    let model = GradientBoostingRegressor::fit(config.boosting, &train_x, &train_y)?;

    let train_metrics = evaluate(&model, &train_x, &train_y);
    let test_metrics = (!test_idx.is_empty()).then(|| evaluate(&model, &test_x, &test_y));

    let mut feature_importances: Vec<FeatureImportance> = FEATURE_NAMES
        .iter()
        .zip(model.feature_importances())
        .map(|(name, importance)| FeatureImportance {
            feature: name.to_string(),
            importance: *importance,
        })
        .collect();
    feature_importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    info!(
        "Train ({} rows): MAE {:.2}, RMSE {:.2}, R² {:.4}",
        train_metrics.rows, train_metrics.mae, train_metrics.rmse, train_metrics.r2
    );
    if let Some(test) = &test_metrics {
        info!(
            "Test ({} rows): MAE {:.2}, RMSE {:.2}, R² {:.4}",
            test.rows, test.mae, test.rmse, test.r2
        );
    }
    for entry in &feature_importances {
        info!("  {:<20} {:.4}", entry.feature, entry.importance);
    }

    let metrics = TrainingMetrics {
        train: train_metrics,
        test: test_metrics,
        feature_importances,
    };
    Ok(ArtifactBundle::new(config.model_version.clone(), model, encodings, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cpu: &str, ram: u32, gpu: &str, price: f64) -> TrainingRow {
        TrainingRow {
            brand: "Asus".to_string(),
            model: "-".to_string(),
            cpu: cpu.to_string(),
            ram_gb: Some(ram),
            storage_gb: Some(512),
            gpu: gpu.to_string(),
            price: Some(price),
        }
    }

    fn table() -> Vec<TrainingRow> {
        let mut rows = Vec::new();
        for i in 0..10u32 {
            let offset = f64::from(i) * 100.0;
            rows.push(row("Intel Core i5-1235U", 8, "Intel Iris Xe", 20_000.0 + offset));
            rows.push(row("Intel Core i7-12700H", 16, "NVIDIA RTX3060", 45_000.0 + offset));
        }
        rows
    }

    #[test]
    fn test_split_is_seeded() {
        let (test_a, train_a) = split_indices(10, 0.2, 42);
        let (test_b, train_b) = split_indices(10, 0.2, 42);

        assert_eq!(test_a.len(), 2);
        assert_eq!(train_a.len(), 8);
        assert_eq!((test_a, train_a), (test_b, train_b));
    }

    #[test]
    fn test_split_keeps_a_training_row() {
        assert_eq!(split_indices(1, 0.2, 42).0.len(), 0);
        assert_eq!(split_indices(3, 0.9, 42).0.len(), 2);
        assert_eq!(split_indices(5, 0.0, 42).0.len(), 0);
    }

    #[test]
    fn test_incomplete_rows_dropped() {
        let mut rows = table();
        rows[0].gpu = "-".to_string();
        rows[1].price = None;

        let (features, prices) = prepare(&rows);

        assert_eq!(features.len(), 18);
        assert_eq!(prices.len(), 18);
    }

    #[test]
    fn test_no_usable_rows() {
        let mut rows = table();
        for row in &mut rows {
            row.ram_gb = None;
        }

        let err = train(&rows, &TrainingConfig::default()).unwrap_err();

        assert!(matches!(err, TrainError::NoUsableRows { .. }));
    }

    #[test]
    fn test_train_bundle() {
        let bundle = train(&table(), &TrainingConfig::default()).unwrap();

        assert_eq!(bundle.model_version(), "gbm-v1");
        assert_eq!(bundle.model().n_trees(), 200);
        let metrics = bundle.metrics();
        assert_eq!(metrics.train.rows, 16);
        assert_eq!(metrics.test.map(|t| t.rows), Some(4));
        assert!(metrics.train.r2 > 0.9);
        assert_eq!(metrics.feature_importances.len(), FEATURE_NAMES.len());
        let importances = &metrics.feature_importances;
        assert!(importances[0].importance >= importances[1].importance);
    }
}
