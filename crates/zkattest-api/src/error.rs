//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps protocol and schema errors to HTTP status codes with a JSON body
//! of error code, message and details. Internal error details are logged,
//! never returned.
//!
//! Rejected submissions are the exception to the envelope: wallets expect
//! `{ok: false, reason, error}` with status 401.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use zkattest_protocol::{LookupError, ProtocolError, VerificationError};
use zkattest_schema::SchemaError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional context for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Body of a rejected submission.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyFailure {
    pub ok: bool,
    /// Machine reason, e.g. `nonce_mismatch`.
    pub reason: String,
    pub error: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Resource existed but is no longer available (410).
    #[error("gone: {0}")]
    Gone(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Schema rejected, with per-violation details (422).
    #[error("validation error: {message}")]
    SchemaInvalid {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Submission rejected by the verifier (401).
    #[error("{0}")]
    Verification(VerificationError),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Gone(_) => (StatusCode::GONE, "GONE"),
            Self::Validation(_) | Self::SchemaInvalid { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            }
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Verification(_) => (StatusCode::UNAUTHORIZED, "VERIFICATION_FAILED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if let Self::Verification(err) = &self {
            let body = VerifyFailure {
                ok: false,
                reason: err.reason().to_string(),
                error: err.to_string(),
            };
            return (status, Json(body)).into_response();
        }

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let details = match self {
            Self::SchemaInvalid { details, .. } => details,
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        let details = match &err {
            SchemaError::Structural { violations } => serde_json::to_value(violations).ok(),
            SchemaError::ValidatorUnavailable(_) => return Self::Internal(err.to_string()),
            _ => None,
        };
        Self::SchemaInvalid {
            message: err.to_string(),
            details,
        }
    }
}

impl From<ProtocolError> for AppError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Schema(e) => e.into(),
            ProtocolError::Compilation(_) | ProtocolError::PublicInput { .. } => {
                Self::Validation(err.to_string())
            }
            ProtocolError::Setup(_)
            | ProtocolError::Serialization(_)
            | ProtocolError::Pipeline(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<VerificationError> for AppError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::MalformedSubmission(msg) => Self::BadRequest(msg),
            other => Self::Verification(other),
        }
    }
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound => Self::NotFound("unknown request".into()),
            LookupError::Expired => Self::Gone("expired".into()),
        }
    }
}
