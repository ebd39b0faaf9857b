//! Error types for the HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::TriageError;

/// API-facing errors. Every response carries a stable `error` kind and a
/// human-readable `message`; validation errors also name the offending
/// batch element and field.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        index: Option<usize>,
        field: Option<String>,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Request-level validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            index: None,
            field: None,
            message: message.into(),
        }
    }

    /// Validation failure pinned to one batch element (and optionally one
    /// of its fields)
    pub fn element(index: usize, field: Option<&str>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            index: Some(index),
            field: field.map(str::to_string),
            message: message.into(),
        }
    }
}

impl From<TriageError> for ApiError {
    fn from(err: TriageError) -> Self {
        match err {
            TriageError::ValidationError(msg) => ApiError::validation(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation {
                index,
                field,
                message,
            } => {
                let body = Json(json!({
                    "error": "validation_error",
                    "message": message,
                    "index": index,
                    "field": field,
                }));
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal server error");
                let body = Json(json!({
                    "error": "internal",
                    "message": "An internal error occurred",
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
