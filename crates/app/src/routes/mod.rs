use axum::Router;
use axum::routing::get;

use crate::state::AppState;

mod analytics;
mod auth;
mod health;
mod progress;
mod questions;
mod quiz_sets;

/// Every route, with the API under `api_prefix` and health at the root.
pub fn router(state: AppState, api_prefix: &str) -> Router {
    let api = Router::new()
        .merge(auth::router())
        .merge(quiz_sets::router())
        .merge(questions::router())
        .merge(progress::router())
        .route("/users/stats", get(analytics::user_stats));

    let prefix = api_prefix.trim_end_matches('/');
    let routes = health::router();
    let routes = if prefix.is_empty() {
        routes.merge(api)
    } else {
        routes.nest(prefix, api)
    };
    routes.with_state(state)
}
