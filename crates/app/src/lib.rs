#![forbid(unsafe_code)]

pub mod config;
pub mod extract;
pub mod logging;
pub mod response;
pub mod routes;
pub mod state;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::Config;
use crate::state::{AppState, ServiceInfo};

pub use services::AppServices;

/// The full application router with tracing and CORS layers.
pub fn build_router(services: AppServices, config: &Config) -> Router {
    let state = AppState::new(
        services,
        ServiceInfo {
            project_name: config.project_name.clone(),
            environment: config.environment.clone(),
        },
    );
    routes::router(state, &config.api_prefix)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
