use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use quiz_core::model::{NewQuestion, Question, QuestionId, QuestionPatch, QuizSetId};
use services::QuestionQuery;

use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::response::{AppError, MessageResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quiz-sets/:id/questions", get(list).post(create))
        .route(
            "/quiz-sets/:id/questions/:question_id",
            get(fetch).put(update).delete(remove),
        )
}

async fn list(
    State(state): State<AppState>,
    ApiPath(quiz_set_id): ApiPath<QuizSetId>,
    ApiQuery(query): ApiQuery<QuestionQuery>,
) -> Result<Json<Vec<Question>>, AppError> {
    if query.limit == Some(0) {
        return Err(AppError::validation("limit must be at least 1"));
    }
    let questions = state
        .services()
        .catalog()
        .list_questions(quiz_set_id, query)
        .await?;
    Ok(Json(questions))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    ApiPath(quiz_set_id): ApiPath<QuizSetId>,
    ApiJson(draft): ApiJson<NewQuestion>,
) -> Result<(StatusCode, Json<Question>), AppError> {
    let question = state
        .services()
        .catalog()
        .create_question(quiz_set_id, draft)
        .await?;
    Ok((StatusCode::CREATED, Json(question)))
}

async fn fetch(
    State(state): State<AppState>,
    ApiPath((quiz_set_id, question_id)): ApiPath<(QuizSetId, QuestionId)>,
) -> Result<Json<Question>, AppError> {
    let question = state
        .services()
        .catalog()
        .get_question(quiz_set_id, question_id)
        .await?;
    Ok(Json(question))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    ApiPath((quiz_set_id, question_id)): ApiPath<(QuizSetId, QuestionId)>,
    ApiJson(patch): ApiJson<QuestionPatch>,
) -> Result<Json<Question>, AppError> {
    let question = state
        .services()
        .catalog()
        .update_question(quiz_set_id, question_id, patch)
        .await?;
    Ok(Json(question))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    ApiPath((quiz_set_id, question_id)): ApiPath<(QuizSetId, QuestionId)>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .services()
        .catalog()
        .delete_question(quiz_set_id, question_id)
        .await?;
    Ok(Json(MessageResponse {
        message: "Question deleted successfully",
    }))
}
