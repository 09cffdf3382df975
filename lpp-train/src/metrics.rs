//! Regression error measures

use lpp_common::{EncodedFeatureVector, PriceModel, SplitMetrics};

pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let total: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum();
    total / actual.len() as f64
}

pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let total: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    (total / actual.len() as f64).sqrt()
}

/// Coefficient of determination
///
/// With constant targets R² is undefined; a perfect fit reports 1, anything
/// else 0.
pub fn r2(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Score a model on one split
pub fn evaluate(
    model: &dyn PriceModel,
    features: &[EncodedFeatureVector],
    targets: &[f64],
) -> SplitMetrics {
    let predicted: Vec<f64> = features.iter().map(|vector| model.predict(vector)).collect();
    SplitMetrics {
        rows: targets.len(),
        mae: mae(targets, &predicted),
        rmse: rmse(targets, &predicted),
        r2: r2(targets, &predicted),
    }
}
