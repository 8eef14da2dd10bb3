//! Structured error types for API responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidStatus,

    // Not found errors
    TaskNotFound,
    SubtaskNotFound,

    // Internal errors
    DatabaseError,
}

impl ErrorCode {
    fn http_status(self) -> StatusCode {
        match self {
            ErrorCode::MissingRequiredField => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::InvalidStatus => StatusCode::BAD_REQUEST,
            ErrorCode::TaskNotFound | ErrorCode::SubtaskNotFound => StatusCode::NOT_FOUND,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Structured error for API responses.
#[derive(Debug, Error, Serialize)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_status(value: &str) -> Self {
        Self::new(
            ErrorCode::InvalidStatus,
            format!(
                "Invalid status {:?}; expected one of \"Pending\", \"In progress\", \"Completed\"",
                value
            ),
        )
        .with_field("status")
    }

    pub fn task_not_found(task_id: i64) -> Self {
        Self::new(ErrorCode::TaskNotFound, format!("Task not found: {}", task_id))
    }

    pub fn subtask_not_found(subtask_id: i64) -> Self {
        Self::new(
            ErrorCode::SubtaskNotFound,
            format!("Subtask not found: {}", subtask_id),
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => {
                tracing::error!("database failure: {:#}", err);
                ApiError::database(err)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.http_status(), Json(self)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
