use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use quiz_core::model::{ProgressDraft, QuizSetId, UserProgress};

use crate::extract::{ApiJson, ApiPath, CurrentUser};
use crate::response::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/progress", post(save))
        .route("/progress/:quiz_set_id", get(fetch))
}

async fn save(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(draft): ApiJson<ProgressDraft>,
) -> Result<Json<UserProgress>, AppError> {
    let progress = state.services().progress().save_progress(user.id, draft).await?;
    Ok(Json(progress))
}

async fn fetch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(quiz_set_id): ApiPath<QuizSetId>,
) -> Result<Json<UserProgress>, AppError> {
    let progress = state
        .services()
        .progress()
        .get_progress(user.id, quiz_set_id)
        .await?;
    Ok(Json(progress))
}
