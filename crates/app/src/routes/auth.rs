use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use quiz_core::model::{User, UserPatch};
use services::{Credentials, Registration, Token};

use crate::extract::{ApiJson, CurrentUser};
use crate::response::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me).put(update_me))
        .route("/auth/refresh", post(refresh))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<Registration>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.services().auth().register(registration).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<Token>, AppError> {
    let token = state.services().auth().login(credentials).await?;
    Ok(Json(token))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Result<Json<User>, AppError> {
    let user = state.services().auth().update_me(&user, patch).await?;
    Ok(Json(user))
}

async fn refresh(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Token>, AppError> {
    Ok(Json(state.services().auth().refresh(&user)?))
}
