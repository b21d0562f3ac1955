use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

#[derive(Serialize)]
struct RootResponse {
    message: String,
    version: &'static str,
    environment: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
}

async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    let info = state.info();
    Json(RootResponse {
        message: info.project_name.clone(),
        version: VERSION,
        environment: info.environment.clone(),
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: VERSION,
        environment: state.info().environment.clone(),
    })
}
