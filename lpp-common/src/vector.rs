//! The fixed model input layout
//!
//! Field order is part of the trained artifact: the model file stores
//! [`FEATURE_NAMES`] and loading refuses a model whose list differs.

use serde::{Deserialize, Serialize};

/// Number of model inputs
pub const FEATURE_COUNT: usize = 7;

/// Model input names, in column order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "ram_gb",
    "storage_gb",
    "cpu_tier",
    "cpu_generation",
    "cpu_brand_code",
    "gpu_class_code",
    "laptop_brand_code",
];

/// One encoded listing, ready for the price model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncodedFeatureVector {
    pub ram_gb: f64,
    pub storage_gb: f64,
    pub cpu_tier: f64,
    pub cpu_generation: f64,
    pub cpu_brand_code: f64,
    pub gpu_class_code: f64,
    pub laptop_brand_code: f64,
}

impl EncodedFeatureVector {
    /// Values in [`FEATURE_NAMES`] order
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.ram_gb,
            self.storage_gb,
            self.cpu_tier,
            self.cpu_generation,
            self.cpu_brand_code,
            self.gpu_class_code,
            self.laptop_brand_code,
        ]
    }

    /// Inverse of [`Self::to_array`]
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        let [
            ram_gb,
            storage_gb,
            cpu_tier,
            cpu_generation,
            cpu_brand_code,
            gpu_class_code,
            laptop_brand_code,
        ] = values;
        Self {
            ram_gb,
            storage_gb,
            cpu_tier,
            cpu_generation,
            cpu_brand_code,
            gpu_class_code,
            laptop_brand_code,
        }
    }

    /// (name, value) pairs in column order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(self.to_array())
    }
}
