//! Shared API plumbing: the error type every handler returns and the
//! blocking-database helper.

use crate::AppState;
use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use devflow_accounts::AccountError;
use devflow_notify::NotifyError;
use devflow_qa::QaError;
use devflow_reputation::ReputationError;
use rusqlite::Connection;
use std::sync::Arc;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Duplicate votes and lost races. Reported as 400.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Validation(_)
            | AccountError::EmailTaken
            | AccountError::UsernameTaken
            | AccountError::InvalidCredentials => ApiError::BadRequest(e.to_string()),
            AccountError::NotFound(_) => ApiError::NotFound("User not found".to_string()),
            AccountError::InvalidToken(_) => {
                ApiError::Unauthorized("Token is not valid".to_string())
            }
            _ => ApiError::InternalServerError(e.to_string()),
        }
    }
}

impl From<QaError> for ApiError {
    fn from(e: QaError) -> Self {
        match e {
            QaError::Validation(msg) => ApiError::BadRequest(msg),
            QaError::Forbidden(msg) => ApiError::Forbidden(msg),
            QaError::QuestionNotFound(_) | QaError::AnswerNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            QaError::AlreadyVoted(_) | QaError::ConcurrentModification { .. } => {
                ApiError::Conflict(e.to_string())
            }
            QaError::Reputation(ReputationError::UserNotFound(_)) => {
                ApiError::NotFound("User not found".to_string())
            }
            _ => ApiError::InternalServerError(e.to_string()),
        }
    }
}

impl From<NotifyError> for ApiError {
    fn from(e: NotifyError) -> Self {
        match e {
            NotifyError::NotFound(_) => ApiError::NotFound("Notification not found".to_string()),
            _ => ApiError::InternalServerError(e.to_string()),
        }
    }
}

impl From<ReputationError> for ApiError {
    fn from(e: ReputationError) -> Self {
        match e {
            ReputationError::UserNotFound(_) => ApiError::NotFound("User not found".to_string()),
            _ => ApiError::InternalServerError(e.to_string()),
        }
    }
}

/// Runs `f` with a pooled connection on the blocking thread pool.
pub(crate) async fn with_conn<T, F>(state: Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;
        f(&mut conn)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
}
