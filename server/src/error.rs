//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use soilsense_core::PredictError;

pub type AppResult<T> = Result<T, AppError>;

/// Request-local failures. Each one answers a single request; none of them
/// touches process state.
#[derive(Debug)]
pub enum AppError {
    /// The reading could not be pushed through the pipeline (schema
    /// reconciliation, scaling or classification refused it).
    BadReading(String),

    /// Artifact-level inconsistency surfaced mid-request (label decode).
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadReading(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::InternalError(msg) => {
                tracing::error!("Pipeline internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.as_str())
            }
        };

        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        match err {
            // A bad decode means the artifact set itself is suspect.
            PredictError::Decode(_) => AppError::InternalError(err.to_string()),
            _ => AppError::BadReading(err.to_string()),
        }
    }
}
