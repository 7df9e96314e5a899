use axum::{extract::OriginalUri, http::StatusCode, Json};
use serde_json::json;

use crate::app::errors::ApiError;

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("Route {} not found", uri.path()))
}
