//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps deposit lifecycle and storage errors to HTTP status codes and a
//! JSON body carrying an error code and message. Internal error details
//! are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use deposit_core::{DepositError, StoreError};

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request was well-formed but semantically invalid (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller may not perform this operation, or the deposit refuses it (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::NotFound { .. } | StoreError::Deleted { .. } => {
                Self::NotFound(err.to_string())
            }
            StoreError::AlreadyExists { .. } | StoreError::RevisionConflict { .. } => {
                Self::Conflict(err.to_string())
            }
            StoreError::BucketLocked(_) => Self::Forbidden(err.to_string()),
            StoreError::Unavailable(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<DepositError> for AppError {
    fn from(err: DepositError) -> Self {
        if let DepositError::Store(store) = err {
            return store.into();
        }
        match &err {
            DepositError::Store(_) => Self::Internal(err.to_string()),
            DepositError::InvalidAction { .. } | DepositError::BucketLocked(_) => {
                Self::Forbidden(err.to_string())
            }
            DepositError::NotFound(_) | DepositError::KeyNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            DepositError::AlreadyExists(_) | DepositError::StaleRevision(_) => {
                Self::Conflict(err.to_string())
            }
            DepositError::SchemaNotFound(_)
            | DepositError::InvalidOrder(_)
            | DepositError::InvalidDocument(_) => Self::Validation(err.to_string()),
        }
    }
}
