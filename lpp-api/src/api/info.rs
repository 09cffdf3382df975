//! Service, model and build information endpoints

use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use lpp_common::{BoostingParams, TrainingMetrics, UNKNOWN_CODE};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

/// Build information response
#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
    pub build_profile: String,
}

/// Known categories of every encoder
#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    /// Code of any category not listed
    pub unknown_code: u32,
    /// Categories in code order, starting at code 1
    pub encoders: BTreeMap<&'static str, Vec<String>>,
}

/// Training run behind the loaded model
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub run_id: String,
    pub model_version: String,
    pub trained_at: DateTime<Utc>,
    pub n_trees: usize,
    pub params: BoostingParams,
    pub metrics: TrainingMetrics,
}

/// GET /
pub async fn index(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": "Laptop Price Prediction API",
        "version": env!("CARGO_PKG_VERSION"),
        "model_version": state.bundle.model_version(),
        "endpoints": {
            "POST /predict": "Predict the price of a laptop",
            "GET /health": "Service status",
            "GET /api/categories": "Categories known to the encoders",
            "GET /api/model": "Training run and evaluation metrics",
            "GET /api/buildinfo": "Build identification",
            "GET /": "This page",
        },
        "example_request": {
            "ram_gb": 16,
            "ssd_gb": 512,
            "islemci": "Intel Core i7-12700H",
            "ekran_karti": "NVIDIA RTX 3060",
            "marka": "Asus",
        },
    }))
}

/// GET /api/categories
pub async fn get_categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    let encoders = state
        .bundle
        .encodings()
        .iter()
        .map(|(field, encoding)| (field, encoding.classes().to_vec()))
        .collect();

    Json(CategoriesResponse {
        unknown_code: UNKNOWN_CODE,
        encoders,
    })
}

/// GET /api/model
pub async fn get_model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    let bundle = &state.bundle;
    Json(ModelInfo {
        run_id: bundle.run_id().to_string(),
        model_version: bundle.model_version().to_string(),
        trained_at: bundle.trained_at(),
        n_trees: bundle.model().n_trees(),
        params: *bundle.model().params(),
        metrics: bundle.metrics().clone(),
    })
}

/// GET /api/buildinfo
pub async fn get_build_info() -> Json<BuildInfo> {
    Json(BuildInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
    })
}

/// Build information routes
pub fn info_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/api/categories", get(get_categories))
        .route("/api/model", get(get_model_info))
        .route("/api/buildinfo", get(get_build_info))
}
