//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionError, QuizSetError, UserError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("quiz set not found")]
    QuizSetNotFound,
    #[error("question not found")]
    QuestionNotFound,
    #[error(transparent)]
    QuizSet(#[from] QuizSetError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("quiz set not found")]
    QuizSetNotFound,
    #[error("progress not found")]
    ProgressNotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ScoringService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScoringError {
    #[error("quiz set not found")]
    QuizSetNotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AnalyticsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyticsError {
    #[error("quiz set not found")]
    QuizSetNotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AuthService` and `TokenIssuer`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Could not validate credentials")]
    InvalidToken,
    #[error(transparent)]
    User(#[from] UserError),
    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("token encoding failed: {0}")]
    Encoding(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
