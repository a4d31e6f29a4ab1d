use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use thiserror::Error as ThisError;

use super::generation::GenerationError;
use super::transport::TransportError;

#[derive(Debug, ThisError)]
pub enum ForgeError {
    /// Every connect attempt of one flight failed.
    #[error("database connection unavailable after {attempts} attempt(s)")]
    ConnectionUnavailable {
        attempts: usize,
        #[source]
        source: Arc<TransportError>,
    },

    /// A store operation lost its race against the budget. The operation may
    /// or may not have taken effect.
    #[error("{operation} did not finish within {budget:?}")]
    OperationTimeout {
        operation: &'static str,
        budget: Duration,
    },

    #[error("store write failed: {0}")]
    StoreWriteFailed(#[source] sqlx::Error),

    #[error("store read failed: {0}")]
    StoreReadFailed(#[source] sqlx::Error),

    #[error("generation failed: {0}")]
    GenerationFailed(#[from] GenerationError),

    #[error("invalid request: {0}")]
    ValidationFailed(String),

    #[error("page not found: {0}")]
    NotFound(String),

    #[error("Ractor error: {0}")]
    RactorError(String),
}

impl From<JsonRejection> for ForgeError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON".to_string(),
            JsonRejection::MissingJsonContentType(_) => {
                "Expected request with `Content-Type: application/json`".to_string()
            }
            _ => "Prompt must be a non-empty string".to_string(),
        };
        ForgeError::ValidationFailed(message)
    }
}

impl IntoResponse for ForgeError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ForgeError::ValidationFailed(message) => {
                (StatusCode::BAD_REQUEST, "INVALID_PROMPT", message.clone())
            }

            ForgeError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "The requested page does not exist.".to_string(),
            ),

            ForgeError::ConnectionUnavailable { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "DATABASE_UNAVAILABLE",
                "Unable to connect to the database. Please try again later.".to_string(),
            ),

            ForgeError::OperationTimeout { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "OPERATION_TIMEOUT",
                "The database did not respond in time. Please try again.".to_string(),
            ),

            ForgeError::StoreWriteFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_WRITE_FAILED",
                "Failed to save the 404 page to the database. Please try again.".to_string(),
            ),

            ForgeError::StoreReadFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_READ_FAILED",
                "Failed to fetch 404 pages.".to_string(),
            ),

            ForgeError::GenerationFailed(err) if err.is_incomplete() => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "GENERATION_INCOMPLETE",
                "Generated 404 page content is incomplete. Please try again.".to_string(),
            ),

            ForgeError::GenerationFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "GENERATION_FAILED",
                "Failed to generate the 404 page content. Please check your prompt and try again."
                    .to_string(),
            ),

            ForgeError::RactorError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal server error occurred.".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, code, error = ?self, "Request failed");
        } else {
            tracing::warn!(status = %status, code, error = %self, "Request rejected");
        }

        let body = ApiErrorBody {
            inner: ApiErrorObject {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}
