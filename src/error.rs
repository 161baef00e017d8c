//! Error handling module
//!
//! Centralized error types and HTTP response conversion.
//!
//! Client errors carry their message to the caller. Server errors are
//! logged in full and answered with a fixed body naming the operation, so
//! no internal detail leaks.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::ValidationError;
use crate::queue::QueueError;
use crate::store::StoreError;

/// Body of a 500 answered by the creation endpoint
pub const CREATE_FAILURE: &str = "Failed to process mint request";

/// Body of a 500 answered by the read endpoints
pub const READ_FAILURE: &str = "Failed to get mints request";

/// Follow-up text attached to every 500
pub const SUPPORT_MESSAGE: &str = "Please contact support.";

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Mint not found: {0}")]
    MintNotFound(Uuid),

    // Server errors (5xx), except an invalid cursor surfacing from the store
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl AppError {
    /// Attach the operation-level message answered on a server error
    pub fn during(self, failure: &'static str) -> ApiError {
        ApiError {
            failure,
            source: self,
        }
    }

    fn is_client_error(&self) -> bool {
        match self {
            AppError::Validation(_) | AppError::MintNotFound(_) => true,
            AppError::Store(e) => e.is_invalid_cursor(),
            _ => false,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// An [`AppError`] bound to the endpoint that produced it
#[derive(Debug)]
pub struct ApiError {
    failure: &'static str,
    source: AppError,
}

impl ApiError {
    /// A request body that axum could not read as JSON
    pub fn from_json_rejection(rejection: JsonRejection) -> Self {
        AppError::Validation(ValidationError::MalformedBody(rejection.body_text()))
            .during(CREATE_FAILURE)
    }

    /// A query string that axum could not deserialize
    pub fn from_query_rejection(rejection: QueryRejection) -> Self {
        AppError::Validation(ValidationError::MalformedQuery(rejection.body_text()))
            .during(READ_FAILURE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.source {
            // 404 Not Found
            AppError::MintNotFound(_) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: self.source.to_string(),
                    message: None,
                },
            ),

            // 400 Bad Request
            err if err.is_client_error() => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: err.to_string(),
                    message: None,
                },
            ),

            // 500 Internal Server Error
            err => {
                tracing::error!(error = %err, "{}", self.failure);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: self.failure.to_string(),
                        message: Some(SUPPORT_MESSAGE.to_string()),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
