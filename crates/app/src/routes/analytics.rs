use axum::Json;
use axum::extract::State;

use quiz_core::analytics::{QuizAnalytics, UserStats};
use quiz_core::model::QuizSetId;

use crate::extract::{ApiPath, CurrentUser};
use crate::response::AppError;
use crate::state::AppState;

pub(super) async fn quiz_set_analytics(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<QuizSetId>,
) -> Result<Json<QuizAnalytics>, AppError> {
    Ok(Json(state.services().analytics().quiz_set_analytics(id).await?))
}

pub(super) async fn user_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserStats>, AppError> {
    Ok(Json(state.services().analytics().user_stats(user.id).await?))
}
