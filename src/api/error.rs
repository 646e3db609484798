//! API error types with structured JSON responses.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::consult::ConsultError;
use crate::diagnosis::DiagnosisError;
use crate::interactions::InteractionError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Classification failed: {0}")]
    ClassificationFailed(String),
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Storage(detail) => {
                tracing::error!(detail, "Storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "The image or log could not be written".to_string(),
                )
            }
            ApiError::InvalidImage(detail) => {
                tracing::info!(detail, "Rejected undecodable upload");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INVALID_IMAGE",
                    "Uploaded file is not a decodable image".to_string(),
                )
            }
            ApiError::ClassificationFailed(detail) => {
                tracing::error!(detail, "Classification failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CLASSIFICATION_FAILED",
                    "The image could not be classified".to_string(),
                )
            }
            ApiError::UpstreamUnavailable(detail) => {
                tracing::warn!(detail, "Upstream service failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_UNAVAILABLE",
                    "Text generation service is unavailable".to_string(),
                )
            }
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone()),
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "Upload exceeds the size limit".to_string(),
            ),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::MethodNotAllowed(detail) => (
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                detail.clone(),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<DiagnosisError> for ApiError {
    fn from(err: DiagnosisError) -> Self {
        match err {
            DiagnosisError::EmptyUpload => ApiError::BadRequest("Uploaded file is empty".into()),
            DiagnosisError::InvalidImage(msg) => ApiError::InvalidImage(msg),
            DiagnosisError::Classification(msg) => ApiError::ClassificationFailed(msg),
            DiagnosisError::Storage(e) => ApiError::Storage(e.to_string()),
            DiagnosisError::Log(msg) => ApiError::Storage(msg),
            DiagnosisError::LockPoisoned => ApiError::Internal("diagnosis log lock poisoned".into()),
        }
    }
}

impl From<ConsultError> for ApiError {
    fn from(err: ConsultError) -> Self {
        if err.is_invalid_input() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::UpstreamUnavailable(err.to_string())
        }
    }
}

impl From<InteractionError> for ApiError {
    fn from(err: InteractionError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest(format!("Malformed multipart body: {}", err.body_text()))
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(err: MultipartRejection) -> Self {
        ApiError::BadRequest(format!("Malformed multipart body: {}", err.body_text()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("worker task failed: {err}"))
    }
}
