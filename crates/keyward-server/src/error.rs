//! HTTP error types for Keyward server.
//!
//! Maps domain errors from `keyward-core` and `keyward-storage` into HTTP
//! responses. Every error produces a JSON body with a machine-readable
//! `error` field and a human-readable `message`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use keyward_core::CipherError;
use keyward_storage::StorageError;

/// Message returned for every decryption failure, whatever its cause.
pub const CANNOT_DECRYPT: &str = "cannot decrypt stored credential";

/// Application-level error returned from HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or invalid bearer token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Client sent invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A stored credential could not be opened.
    #[error("cannot decrypt stored credential")]
    CannotDecrypt,

    /// The upstream backend could not be reached.
    #[error("bad gateway: {0}")]
    BadGateway(String),

    /// A dependency is not configured or not available.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Internal error (storage, crypto, etc.). Details are logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::CannotDecrypt => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "cannot_decrypt",
                CANNOT_DECRYPT.to_owned(),
            ),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_owned(),
                )
            }
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<CipherError> for AppError {
    fn from(err: CipherError) -> Self {
        if err.is_open_failure() {
            Self::CannotDecrypt
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        Self::Internal(err.to_string())
    }
}
