use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use quiz_core::model::{
    Answer, AnswerSheet, NewQuizSet, QuestionId, QuizSet, QuizSetId, QuizSetPatch,
};
use quiz_core::scoring::Scorecard;

use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::response::{AppError, MessageResponse};
use crate::state::AppState;

const DEFAULT_PAGE: u32 = 100;
const MAX_PAGE: u32 = 1000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quiz-sets", get(list).post(create))
        .route("/quiz-sets/:id", get(fetch).put(update).delete(remove))
        .route("/quiz-sets/:id/submit", post(submit))
        .route("/quiz-sets/:id/analytics", get(super::analytics::quiz_set_analytics))
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    skip: u32,
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Submission {
    answers: BTreeMap<String, Answer>,
}

impl Submission {
    /// Keys that are not question ids cannot match a question and are dropped.
    fn into_sheet(self) -> AnswerSheet {
        self.answers
            .into_iter()
            .filter_map(|(key, answer)| match key.parse::<QuestionId>() {
                Ok(id) => Some((id, answer)),
                Err(_) => {
                    debug!(key = %key, "ignoring answer for unknown question key");
                    None
                }
            })
            .collect()
    }
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<QuizSet>>, AppError> {
    let limit = page.limit.unwrap_or(DEFAULT_PAGE);
    if !(1..=MAX_PAGE).contains(&limit) {
        return Err(AppError::validation(format!(
            "limit must be between 1 and {MAX_PAGE}"
        )));
    }
    let sets = state.services().catalog().list_quiz_sets(page.skip, limit).await?;
    Ok(Json(sets))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    ApiJson(draft): ApiJson<NewQuizSet>,
) -> Result<(StatusCode, Json<QuizSet>), AppError> {
    let quiz_set = state.services().catalog().create_quiz_set(draft).await?;
    Ok((StatusCode::CREATED, Json(quiz_set)))
}

async fn fetch(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<QuizSetId>,
) -> Result<Json<QuizSet>, AppError> {
    Ok(Json(state.services().catalog().get_quiz_set(id).await?))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    ApiPath(id): ApiPath<QuizSetId>,
    ApiJson(patch): ApiJson<QuizSetPatch>,
) -> Result<Json<QuizSet>, AppError> {
    Ok(Json(state.services().catalog().update_quiz_set(id, patch).await?))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    ApiPath(id): ApiPath<QuizSetId>,
) -> Result<Json<MessageResponse>, AppError> {
    state.services().catalog().delete_quiz_set(id).await?;
    Ok(Json(MessageResponse {
        message: "Quiz set deleted successfully",
    }))
}

async fn submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<QuizSetId>,
    ApiJson(submission): ApiJson<Submission>,
) -> Result<Json<Scorecard>, AppError> {
    let scorecard = state
        .services()
        .scoring()
        .submit(user.id, id, submission.into_sheet())
        .await?;
    Ok(Json(scorecard))
}
