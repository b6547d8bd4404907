//! Erreurs de l'API HTTP et leur traduction en statut + corps JSON

use crate::scanner::ScanError;
use crate::snapshot::SnapshotError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub const SNAPSHOT_MISSING: &str = "Network data not found";
pub const SNAPSHOT_MISSING_HINT: &str = "Network data not found. Run scan first.";
pub const DEVICE_MISSING: &str = "Device not found";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response(),
            ApiError::Snapshot(e) => {
                tracing::error!(error = %e, "snapshot read failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))).into_response()
            }
            ApiError::Scan(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.detail() })),
            )
                .into_response(),
        }
    }
}
