use std::str::FromStr;

use chrono::{DateTime, Utc};
use quiz_core::model::{
    Difficulty, Question, QuestionKind, QuizAttempt, QuizSet, Role, User, UserProgress,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Unique violations become `Conflict`; everything else is a connection error.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StorageError::Conflict(db.message().to_owned())
        }
        _ => StorageError::Connection(e.to_string()),
    }
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

fn json_col<T: DeserializeOwned>(row: &SqliteRow, column: &'static str) -> Result<T, StorageError> {
    let raw: String = row.try_get(column).map_err(ser)?;
    serde_json::from_str(&raw)
        .map_err(|e| StorageError::Serialization(format!("{column}: {e}")))
}

fn parsed_col<T>(row: &SqliteRow, column: &'static str) -> Result<T, StorageError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    let raw: String = row.try_get(column).map_err(ser)?;
    raw.parse()
        .map_err(|e| StorageError::Serialization(format!("{column}: {e}")))
}

fn u32_col(row: &SqliteRow, column: &'static str) -> Result<u32, StorageError> {
    let v: i64 = row.try_get(column).map_err(ser)?;
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {column}: {v}")))
}

fn time_col(row: &SqliteRow, column: &'static str) -> Result<DateTime<Utc>, StorageError> {
    row.try_get(column).map_err(ser)
}

fn opt_time_col(
    row: &SqliteRow,
    column: &'static str,
) -> Result<Option<DateTime<Utc>>, StorageError> {
    row.try_get(column).map_err(ser)
}

pub(crate) fn map_quiz_set_row(row: &SqliteRow) -> Result<QuizSet, StorageError> {
    Ok(QuizSet {
        id: parsed_col(row, "id")?,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        category: row.try_get("category").map_err(ser)?,
        difficulty: parsed_col::<Difficulty>(row, "difficulty")?,
        estimated_time: u32_col(row, "estimated_time")?,
        total_questions: u32_col(row, "total_questions")?,
        is_active: row.try_get("is_active").map_err(ser)?,
        created_at: time_col(row, "created_at")?,
        updated_at: opt_time_col(row, "updated_at")?,
    })
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let kind: String = row.try_get("type").map_err(ser)?;
    Ok(Question {
        id: parsed_col(row, "id")?,
        quiz_set_id: parsed_col(row, "quiz_set_id")?,
        prompt: row.try_get("question").map_err(ser)?,
        options: json_col(row, "options")?,
        correct_answer: json_col(row, "correct_answer")?,
        kind: QuestionKind::parse(&kind).map_err(ser)?,
        justification: row.try_get("justification").map_err(ser)?,
        difficulty: parsed_col::<Difficulty>(row, "difficulty")?,
        category: row.try_get("category").map_err(ser)?,
        tags: json_col(row, "tags")?,
        time_limit: u32_col(row, "time_limit")?,
        points: u32_col(row, "points")?,
        explanation: row.try_get("explanation").map_err(ser)?,
        hints: json_col(row, "hints")?,
        screenshots: json_col(row, "screenshots")?,
        reference_links: json_col(row, "reference_links")?,
        videos: json_col(row, "videos")?,
        review_status: row.try_get("review_status").map_err(ser)?,
        difficulty_rating: row.try_get("difficulty_rating").map_err(ser)?,
        success_rate: row.try_get("success_rate").map_err(ser)?,
        created_at: time_col(row, "created_at")?,
        updated_at: opt_time_col(row, "updated_at")?,
        last_updated: opt_time_col(row, "last_updated")?,
    })
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<UserProgress, StorageError> {
    Ok(UserProgress {
        id: parsed_col(row, "id")?,
        user_id: parsed_col(row, "user_id")?,
        quiz_set_id: parsed_col(row, "quiz_set_id")?,
        current_question: u32_col(row, "current_question")?,
        answers: json_col(row, "answers")?,
        score: row.try_get("score").map_err(ser)?,
        time_spent: u32_col(row, "time_spent")?,
        completed_at: opt_time_col(row, "completed_at")?,
        created_at: time_col(row, "created_at")?,
        updated_at: opt_time_col(row, "updated_at")?,
    })
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<QuizAttempt, StorageError> {
    Ok(QuizAttempt {
        id: parsed_col(row, "id")?,
        user_id: parsed_col(row, "user_id")?,
        quiz_set_id: parsed_col(row, "quiz_set_id")?,
        answers: json_col(row, "answers")?,
        score: row.try_get("score").map_err(ser)?,
        correct_answers: u32_col(row, "correct_answers")?,
        total_questions: u32_col(row, "total_questions")?,
        time_spent: u32_col(row, "time_spent")?,
        detailed_results: json_col(row, "detailed_results")?,
        completed_at: opt_time_col(row, "completed_at")?,
        created_at: time_col(row, "created_at")?,
    })
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    Ok(User {
        id: parsed_col(row, "id")?,
        name: row.try_get("name").map_err(ser)?,
        email: row.try_get("email").map_err(ser)?,
        password_hash: row.try_get("password_hash").map_err(ser)?,
        role: parsed_col::<Role>(row, "role")?,
        created_at: time_col(row, "created_at")?,
        updated_at: opt_time_col(row, "updated_at")?,
    })
}
