//! Price model
//!
//! The service only needs [`PriceModel::predict`]; the training pipeline fits a
//! [`GradientBoostingRegressor`] and hands it to the artifact bundle.

pub mod gbm;
pub mod tree;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vector::EncodedFeatureVector;

pub use gbm::GradientBoostingRegressor;
pub use tree::{RegressionTree, TreeNode};

/// Anything that turns an encoded listing into a price
pub trait PriceModel: Send + Sync {
    fn predict(&self, features: &EncodedFeatureVector) -> f64;
}

/// Hyperparameters of the boosted ensemble
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Shrinkage applied to every tree's output
    pub learning_rate: f64,
    /// Maximum tree depth (root has depth 0)
    pub max_depth: usize,
    /// Minimum samples a node needs to be split
    pub min_samples_split: usize,
    /// Minimum samples on each side of a split
    pub min_samples_leaf: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            learning_rate: 0.1,
            max_depth: 5,
            min_samples_split: 5,
            min_samples_leaf: 2,
        }
    }
}

impl BoostingParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(Error::Config("n_estimators must be at least 1".to_string()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::Config(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        if self.min_samples_split < 2 {
            return Err(Error::Config("min_samples_split must be at least 2".to_string()));
        }
        if self.min_samples_leaf == 0 {
            return Err(Error::Config("min_samples_leaf must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        let params = BoostingParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.n_estimators, 200);
        assert_eq!(params.max_depth, 5);
    }

    #[test]
    fn test_invalid_params() {
        let params = BoostingParams {
            learning_rate: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = BoostingParams {
            min_samples_split: 1,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
