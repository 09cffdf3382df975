//! HTTP API handlers for lpp-api

pub mod health;
pub mod info;
pub mod predict;

pub use health::health_routes;
pub use info::info_routes;
pub use predict::predict_routes;

use axum::http::Uri;

use crate::ApiError;

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
