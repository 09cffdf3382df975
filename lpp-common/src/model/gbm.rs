//! Least-squares gradient boosting
//!
//! 1. Start from the mean price.
//! 2. Each round fits a regression tree to the current residuals.
//! 3. The tree's output, scaled by the learning rate, is added to the ensemble.

use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeLimits};
use super::{BoostingParams, PriceModel};
use crate::error::{Error, Result};
use crate::vector::{EncodedFeatureVector, FEATURE_COUNT};

/// Boosted ensemble of regression trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    params: BoostingParams,
    init_prediction: f64,
    trees: Vec<RegressionTree>,
    feature_importances: [f64; FEATURE_COUNT],
}

impl GradientBoostingRegressor {
    /// Fit the ensemble
    ///
    /// # Errors
    /// Invalid parameters, no samples, a length mismatch between `features`
    /// and `targets`, or a non-finite value anywhere in the input.
    pub fn fit(
        params: BoostingParams,
        features: &[EncodedFeatureVector],
        targets: &[f64],
    ) -> Result<Self> {
        params.validate()?;
        if features.is_empty() {
            return Err(Error::Model("cannot fit on zero samples".to_string()));
        }
        if features.len() != targets.len() {
            return Err(Error::Model(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }

        let rows: Vec<[f64; FEATURE_COUNT]> =
            features.iter().map(EncodedFeatureVector::to_array).collect();
        if let Some(position) = rows.iter().position(|row| row.iter().any(|v| !v.is_finite())) {
            return Err(Error::Model(format!("feature row {position} contains a non-finite value")));
        }
        if let Some(position) = targets.iter().position(|t| !t.is_finite()) {
            return Err(Error::Model(format!("target {position} is not finite")));
        }

        let limits = TreeLimits {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
        };
        let init_prediction = targets.iter().sum::<f64>() / targets.len() as f64;
        let mut predictions = vec![init_prediction; targets.len()];
        let mut residuals = vec![0.0; targets.len()];
        let mut importances = [0.0; FEATURE_COUNT];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let fitted = targets.iter().zip(&predictions);
            for (residual, (target, prediction)) in residuals.iter_mut().zip(fitted) {
                *residual = target - prediction;
            }
            let tree = RegressionTree::fit(&rows, &residuals, limits, &mut importances);
            for (prediction, row) in predictions.iter_mut().zip(&rows) {
                *prediction += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for importance in &mut importances {
                *importance /= total;
            }
        }

        Ok(Self {
            params,
            init_prediction,
            trees,
            feature_importances: importances,
        })
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Share of the total squared-error reduction attributed to each feature
    ///
    /// Sums to 1, or is all zeros when no tree ever split.
    pub fn feature_importances(&self) -> &[f64; FEATURE_COUNT] {
        &self.feature_importances
    }

    /// Reject a decoded model that cannot be evaluated safely
    pub fn validate(&self) -> Result<()> {
        if !self.init_prediction.is_finite() {
            return Err(Error::Model("initial prediction is not finite".to_string()));
        }
        if !self.params.learning_rate.is_finite() {
            return Err(Error::Model("learning rate is not finite".to_string()));
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|e| Error::Model(format!("tree {index}: {e}")))?;
        }
        Ok(())
    }
}

impl PriceModel for GradientBoostingRegressor {
    fn predict(&self, features: &EncodedFeatureVector) -> f64 {
        let row = features.to_array();
        let boost: f64 = self.trees.iter().map(|tree| tree.predict(&row)).sum();
        self.init_prediction + self.params.learning_rate * boost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(ram: f64, gpu_code: f64) -> EncodedFeatureVector {
        EncodedFeatureVector {
            ram_gb: ram,
            storage_gb: 512.0,
            cpu_tier: 5.0,
            cpu_generation: 12.0,
            cpu_brand_code: 1.0,
            gpu_class_code: gpu_code,
            laptop_brand_code: 1.0,
        }
    }

    fn corpus() -> (Vec<EncodedFeatureVector>, Vec<f64>) {
        let mut features = Vec::new();
        let mut targets = Vec::new();
        for ram in [8.0, 16.0, 32.0] {
            for gpu in [1.0, 2.0] {
                for _ in 0..4 {
                    features.push(vector(ram, gpu));
                    targets.push(ram * 1000.0 + gpu * 5000.0);
                }
            }
        }
        (features, targets)
    }

    #[test]
    fn test_fit_learns_signal() {
        let (features, targets) = corpus();
        let model =
            GradientBoostingRegressor::fit(BoostingParams::default(), &features, &targets).unwrap();

        assert_eq!(model.n_trees(), 200);
        for (features, target) in features.iter().zip(&targets) {
            let predicted = model.predict(features);
            assert!((predicted - target).abs() < 1.0, "predicted {predicted}, expected {target}");
        }
    }

    #[test]
    fn test_importances_normalized() {
        let (features, targets) = corpus();
        let model =
            GradientBoostingRegressor::fit(BoostingParams::default(), &features, &targets).unwrap();

        let importances = model.feature_importances();
        let total: f64 = importances.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        // Only RAM and the GPU code vary in the corpus
        assert!(importances[0] > 0.0);
        assert!(importances[5] > 0.0);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_constant_target() {
        let features = vec![vector(8.0, 1.0), vector(16.0, 2.0)];
        let targets = vec![25_000.0, 25_000.0];
        let model =
            GradientBoostingRegressor::fit(BoostingParams::default(), &features, &targets).unwrap();

        assert_eq!(model.predict(&vector(64.0, 3.0)), 25_000.0);
        assert_eq!(model.feature_importances(), &[0.0; FEATURE_COUNT]);
    }

    #[test]
    fn test_fit_errors() {
        let params = BoostingParams::default();
        assert!(GradientBoostingRegressor::fit(params, &[], &[]).is_err());
        assert!(GradientBoostingRegressor::fit(params, &[vector(8.0, 1.0)], &[1.0, 2.0]).is_err());
        assert!(GradientBoostingRegressor::fit(params, &[vector(8.0, 1.0)], &[f64::NAN]).is_err());
        let infinite = [vector(f64::INFINITY, 1.0)];
        assert!(GradientBoostingRegressor::fit(params, &infinite, &[1.0]).is_err());
    }

    #[test]
    fn test_persisted_model_predicts_identically() {
        let (features, targets) = corpus();
        let params = BoostingParams {
            n_estimators: 20,
            ..Default::default()
        };
        let model = GradientBoostingRegressor::fit(params, &features, &targets).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: GradientBoostingRegressor = serde_json::from_str(&json).unwrap();

        assert!(restored.validate().is_ok());
        let drift = (restored.predict(&features[0]) - model.predict(&features[0])).abs();
        assert!(drift < 1e-6, "prediction drifted by {drift}");
    }
}
