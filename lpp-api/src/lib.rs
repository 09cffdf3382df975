//! lpp-api library interface
//!
//! The inference service: one trained artifact bundle, loaded at startup and
//! shared read-only by every request.

pub mod api;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use lpp_common::{ArtifactBundle, FeatureDefaults};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Model and encodings of one training run
    pub bundle: Arc<ArtifactBundle>,
    /// Values for request fields that are neither given nor extractable
    pub defaults: Arc<FeatureDefaults>,
    /// Where the bundle was loaded from
    pub artifacts_dir: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(bundle: ArtifactBundle, defaults: FeatureDefaults, artifacts_dir: PathBuf) -> Self {
        Self {
            bundle: Arc::new(bundle),
            defaults: Arc::new(defaults),
            artifacts_dir,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::predict_routes())
        .merge(api::health_routes())
        .merge(api::info_routes())
        .fallback(api::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
