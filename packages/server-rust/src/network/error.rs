//! HTTP error envelope and `DispatchError` mapping.
//!
//! Every non-2xx response from the launch surface has the body
//! `{"error": {"message": "..."}}`. Messages are safe for callers; internal
//! detail stays in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::service::DispatchError;

/// Message returned with 500 when the store could not record the request.
pub const NOT_ACCEPTED_MESSAGE: &str =
    "request was not accepted because the request store is unavailable; it is safe to resubmit";

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorDetail<'a> {
    message: &'a str,
}

/// HTTP API error: a status code plus a caller-safe message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Returns an error response for invalid input.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Returns an error response when the server cannot take work right now.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    /// Returns an internal error response.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Returns an error response with an arbitrary status, for failures the
    /// framework detects before a handler runs.
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, message)
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the caller-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Validation(e) => Self::bad_request(e.to_string()),
            DispatchError::UnknownModule(e) => Self::bad_request(e.to_string()),
            DispatchError::StoreUnavailable(_) => Self::internal(NOT_ACCEPTED_MESSAGE),
            DispatchError::Overloaded => Self::unavailable(err.to_string()),
            DispatchError::Internal(detail) => {
                error!(error = %detail, "launch dispatch failed internally");
                Self::internal("internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                message: &self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}
