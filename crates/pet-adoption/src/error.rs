use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::ConfigError;
use crate::store::StoreError;
use crate::telemetry::TelemetryError;
use crate::workflows::adoption::AdoptionError;
use crate::workflows::catalog::CatalogError;

/// Process-level error surfaced by the binaries and by ad-hoc handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("adoption workflow error: {0}")]
    Adoption(#[from] AdoptionError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Adoption(error) => error.into_response(),
            AppError::Catalog(error) => error.into_response(),
            AppError::Store(error) => error_response(store_status(&error), &error),
            other => error_response(StatusCode::INTERNAL_SERVER_ERROR, &other),
        }
    }
}

/// Transport status for a storage failure that reached the boundary. Workflows report missing
/// records themselves, so a store-level miss here is an internal inconsistency.
pub(crate) fn store_status(error: &StoreError) -> StatusCode {
    match error {
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Conflict(_) | StoreError::NotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(status: StatusCode, error: &dyn std::error::Error) -> Response {
    let body = Json(json!({ "error": error.to_string() }));
    (status, body).into_response()
}
