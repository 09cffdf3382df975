//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use lpp_common::artifacts::{ENCODINGS_FILE, MODEL_FILE};
use lpp_common::{CategoryEncodings, FEATURE_NAMES};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok": the service does not start without its artifacts
    pub status: String,
    /// Module name ("lpp-api")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    pub model_version: String,
    pub run_id: String,
    pub model_file: String,
    pub encodings_file: String,
    /// Model inputs, in vector order
    pub features: Vec<&'static str>,
    pub available_encoders: Vec<&'static str>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "lpp-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        model_version: state.bundle.model_version().to_string(),
        run_id: state.bundle.run_id().to_string(),
        model_file: state.artifacts_dir.join(MODEL_FILE).display().to_string(),
        encodings_file: state.artifacts_dir.join(ENCODINGS_FILE).display().to_string(),
        features: FEATURE_NAMES.to_vec(),
        available_encoders: CategoryEncodings::FIELDS.to_vec(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
