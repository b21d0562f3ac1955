use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use services::{AnalyticsError, AuthError, CatalogError, ProgressError, ScoringError};
use storage::StorageError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// An error on its way to the client.
///
/// Internal errors are logged in full and returned with a generic message.
#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    is_operational: bool,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    /// Duplicates answer 400, not 409.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "CONFLICT", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR",
            message: message.into(),
            is_operational: false,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn operational(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            is_operational: true,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_operational {
            self.message
        } else {
            error!(error = %self.message, "request failed");
            "Internal server error".to_owned()
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code.to_owned(),
        };
        (self.status, Json(body)).into_response()
    }
}

//
// ─── SERVICE ERROR MAPPING ─────────────────────────────────────────────────────
//

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::not_found("Not found"),
            StorageError::Conflict(msg) => Self::conflict(msg),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::QuizSetNotFound => Self::not_found("Quiz set not found"),
            CatalogError::QuestionNotFound => Self::not_found("Question not found"),
            CatalogError::QuizSet(e) => Self::validation(e.to_string()),
            CatalogError::Question(e) => Self::validation(e.to_string()),
            CatalogError::Storage(e) => e.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<ProgressError> for AppError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::QuizSetNotFound => Self::not_found("Quiz set not found"),
            ProgressError::ProgressNotFound => Self::not_found("Progress not found"),
            ProgressError::Storage(e) => e.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::QuizSetNotFound => Self::not_found("Quiz set not found"),
            ScoringError::Storage(e) => e.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::QuizSetNotFound => Self::not_found("Quiz set not found"),
            AnalyticsError::Storage(e) => e.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken => Self::conflict(err.to_string()),
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                Self::unauthorized(err.to_string())
            }
            AuthError::User(e) => Self::validation(e.to_string()),
            AuthError::Storage(e) => e.into(),
            other => Self::internal(other.to_string()),
        }
    }
}
