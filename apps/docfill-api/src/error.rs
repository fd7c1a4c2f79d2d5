//! Error types for the doc-service API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docfill_core::DocError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid DOCX file")]
    InvalidDocument,

    #[error("{0}")]
    Validation(String),

    #[error("AI_STUDIO_API_KEY not configured")]
    MissingApiKey,

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Map a substitution failure onto the render endpoint's contract:
    /// bad input is a validation error, everything else is upstream.
    pub fn from_render(err: DocError) -> Self {
        match err {
            DocError::FileTooLarge => ApiError::Validation("file_too_large".to_string()),
            DocError::InvalidDocument => ApiError::Validation("Invalid DOCX file".to_string()),
            DocError::PatternError(_) | DocError::WriteError(_) => {
                tracing::error!("Document fill failed: {}", err);
                ApiError::Upstream("render_failed".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidDocument => {
                (StatusCode::BAD_REQUEST, "Invalid DOCX file".to_string())
            }
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::MissingApiKey => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI_STUDIO_API_KEY not configured".to_string(),
            ),
            ApiError::Upstream(code) => (StatusCode::BAD_GATEWAY, code.clone()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
