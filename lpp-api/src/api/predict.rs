//! Price prediction endpoint
//!
//! Every request field is optional. Each one is resolved in order:
//! 1. the value given in the request
//! 2. the value extracted from the listing title, if one was sent
//! 3. the configured default
//!
//! The resolved raw values then go through the same derivation and encoding
//! the training run used.

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use lpp_common::features::{
    extract_features, is_unresolved, normalize, CpuBrand, ExtractedFeatures, GpuClass,
    NormalizedFeatures, OTHER_BRAND,
};
use lpp_common::{derive_listing_features, FeatureDefaults, ListingFeatures};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ApiError, ApiResult, AppState};

/// A size given as a JSON number or as a numeric string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SizeValue {
    Number(f64),
    Text(String),
}

impl SizeValue {
    /// The value in GB; negative, non-finite and non-numeric values are rejected
    pub fn gigabytes(&self, field: &str) -> ApiResult<f64> {
        let value = match self {
            SizeValue::Number(value) => *value,
            SizeValue::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                ApiError::BadRequest(format!("{field} must be a number, got \"{text}\""))
            })?,
        };
        if !value.is_finite() || value < 0.0 {
            return Err(ApiError::BadRequest(format!(
                "{field} must be a non-negative number, got {value}"
            )));
        }
        Ok(value)
    }
}

/// POST /predict request body
///
/// Field names follow the marketplace data; the English names are accepted
/// as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub ram_gb: Option<SizeValue>,
    #[serde(default, alias = "storage_gb")]
    pub ssd_gb: Option<SizeValue>,
    #[serde(default, alias = "cpu")]
    pub islemci: Option<String>,
    #[serde(default, alias = "gpu")]
    pub ekran_karti: Option<String>,
    #[serde(default, alias = "brand")]
    pub marka: Option<String>,
    /// Listing title, used for any field not given explicitly
    #[serde(default, alias = "title")]
    pub urun_adi: Option<String>,
}

/// Derived features the prediction was made from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputFeatures {
    pub ram_gb: f64,
    pub ssd_gb: f64,
    pub cpu_tier: u8,
    pub cpu_generation: u8,
    pub cpu_brand: CpuBrand,
    pub gpu_class: GpuClass,
    pub laptop_brand: String,
}

impl From<&ListingFeatures> for InputFeatures {
    fn from(features: &ListingFeatures) -> Self {
        Self {
            ram_gb: features.ram_gb,
            ssd_gb: features.storage_gb,
            cpu_tier: features.classified.cpu_tier,
            cpu_generation: features.classified.cpu_generation,
            cpu_brand: features.classified.cpu_brand,
            gpu_class: features.classified.gpu_class,
            laptop_brand: features.laptop_brand.clone(),
        }
    }
}

/// POST /predict response
#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    /// Non-negative, rounded to 2 decimals
    pub predicted_price: f64,
    pub model_version: String,
    pub input_features: InputFeatures,
    pub encoded_features: BTreeMap<&'static str, f64>,
    /// Categorical fields encoded with the unknown code
    pub fallbacks: Vec<&'static str>,
}

fn given(text: &Option<String>) -> Option<&str> {
    text.as_deref().map(str::trim).filter(|text| !text.is_empty())
}

/// Resolve every field of a request and derive its features
pub fn resolve_features(
    request: &PredictRequest,
    defaults: &FeatureDefaults,
) -> ApiResult<ListingFeatures> {
    let ram_gb = request.ram_gb.as_ref().map(|v| v.gigabytes("ram_gb")).transpose()?;
    let storage_gb = request.ssd_gb.as_ref().map(|v| v.gigabytes("ssd_gb")).transpose()?;

    let title: Option<(ExtractedFeatures, NormalizedFeatures)> =
        given(&request.urun_adi).map(|title| {
            let extracted = extract_features(title);
            let sizes = normalize(&extracted);
            (extracted, sizes)
        });
    let extracted = title.as_ref().map(|(extracted, _)| extracted);
    let sizes = title.as_ref().map(|(_, sizes)| sizes);

    let ram_gb = ram_gb
        .or_else(|| sizes.and_then(|s| s.ram_gb).map(f64::from))
        .unwrap_or(defaults.ram_gb);
    let storage_gb = storage_gb
        .or_else(|| sizes.and_then(|s| s.storage_gb).map(f64::from))
        .unwrap_or(defaults.storage_gb);
    let cpu = given(&request.islemci)
        .or_else(|| extracted.map(|e| e.cpu.as_str()).filter(|cpu| !is_unresolved(cpu)))
        .unwrap_or(defaults.cpu.as_str());
    let gpu = given(&request.ekran_karti)
        .or_else(|| extracted.map(|e| e.gpu.as_str()))
        .unwrap_or(defaults.gpu.as_str());
    let brand = given(&request.marka)
        .or_else(|| extracted.map(|e| e.brand.as_str()).filter(|brand| *brand != OTHER_BRAND))
        .unwrap_or(defaults.brand.as_str());

    debug!(
        "Resolved request: ram {} GB, storage {} GB, cpu '{}', gpu '{}', brand '{}'",
        ram_gb, storage_gb, cpu, gpu, brand
    );
    Ok(derive_listing_features(ram_gb, storage_gb, cpu, gpu, brand))
}

/// Clamp to zero and round to 2 decimals
pub fn round_price(price: f64) -> f64 {
    (price.max(0.0) * 100.0).round() / 100.0
}

/// POST /predict
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> ApiResult<Json<PredictResponse>> {
    let Json(request) = payload?;
    let features = resolve_features(&request, &state.defaults)?;

    let prediction = state.bundle.predict(&features);
    if !prediction.price.is_finite() {
        return Err(ApiError::Internal("Model produced a non-finite price".to_string()));
    }
    if !prediction.fallbacks.is_empty() {
        debug!(
            "Unseen categories encoded as unknown: {}",
            prediction.fallbacks.join(", ")
        );
    }

    Ok(Json(PredictResponse {
        predicted_price: round_price(prediction.price),
        model_version: state.bundle.model_version().to_string(),
        input_features: InputFeatures::from(&features),
        encoded_features: prediction.vector.named().collect(),
        fallbacks: prediction.fallbacks,
    }))
}

/// Build prediction routes
pub fn predict_routes() -> Router<AppState> {
    Router::new().route("/predict", post(predict))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> PredictRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_explicit_values() {
        let features = resolve_features(
            &request(
                r#"{"ram_gb": 16, "ssd_gb": "1024", "islemci": "Intel Core i7-12700H",
                    "ekran_karti": "NVIDIA RTX 3060", "marka": "asus"}"#,
            ),
            &FeatureDefaults::default(),
        )
        .unwrap();

        assert_eq!(features.ram_gb, 16.0);
        assert_eq!(features.storage_gb, 1024.0);
        assert_eq!(features.classified.cpu_tier, 7);
        assert_eq!(features.classified.cpu_generation, 12);
        assert_eq!(features.classified.gpu_class, GpuClass::Rtx30);
        assert_eq!(features.laptop_brand, "Asus");
    }

    #[test]
    fn test_english_aliases() {
        let features = resolve_features(
            &request(r#"{"storage_gb": 256, "cpu": "AMD Ryzen 5 5600H", "gpu": "GTX 1650", "brand": "MSI"}"#),
            &FeatureDefaults::default(),
        )
        .unwrap();

        assert_eq!(features.storage_gb, 256.0);
        assert_eq!(features.classified.cpu_brand, CpuBrand::Amd);
        assert_eq!(features.classified.gpu_class, GpuClass::Gtx);
        assert_eq!(features.laptop_brand, "MSI");
    }

    #[test]
    fn test_title_fills_missing_fields() {
        let features = resolve_features(
            &request(r#"{"urun_adi": "Apple MacBook Air M2 8GB 256GB SSD", "ram_gb": 16}"#),
            &FeatureDefaults::default(),
        )
        .unwrap();

        assert_eq!(features.ram_gb, 16.0);
        assert_eq!(features.storage_gb, 256.0);
        assert_eq!(features.classified.cpu_brand, CpuBrand::Apple);
        assert_eq!(features.classified.cpu_generation, 12);
        assert_eq!(features.classified.gpu_class, GpuClass::AppleGpu);
        assert_eq!(features.laptop_brand, "Apple");
    }

    #[test]
    fn test_defaults() {
        let features = resolve_features(&request("{}"), &FeatureDefaults::default()).unwrap();

        assert_eq!((features.ram_gb, features.storage_gb), (16.0, 512.0));
        assert_eq!(features.classified.cpu_tier, 5);
        assert_eq!(features.classified.cpu_generation, 10);
        assert_eq!(features.classified.cpu_brand, CpuBrand::Intel);
        assert_eq!(features.classified.gpu_class, GpuClass::Integrated);
        assert_eq!(features.laptop_brand, "Other");
    }

    #[test]
    fn test_blank_strings_fall_back() {
        let features = resolve_features(
            &request(r#"{"islemci": "  ", "marka": "", "ram_gb": null}"#),
            &FeatureDefaults::default(),
        )
        .unwrap();

        assert_eq!(features.ram_gb, 16.0);
        assert_eq!(features.classified.cpu_tier, 5);
        assert_eq!(features.laptop_brand, "Other");
    }

    #[test]
    fn test_invalid_sizes_rejected() {
        let defaults = FeatureDefaults::default();
        for body in [r#"{"ram_gb": -8}"#, r#"{"ssd_gb": "lots"}"#, r#"{"ram_gb": "NaN"}"#] {
            let result = resolve_features(&request(body), &defaults);
            assert!(matches!(result, Err(ApiError::BadRequest(_))), "{body} accepted");
        }
    }

    #[test]
    fn test_round_price() {
        assert_eq!(round_price(24_999.456), 24_999.46);
        assert_eq!(round_price(-150.0), 0.0);
        assert_eq!(round_price(0.004), 0.0);
    }
}
