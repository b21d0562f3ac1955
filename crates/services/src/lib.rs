#![forbid(unsafe_code)]

pub mod analytics_service;
pub mod app_services;
pub mod auth_service;
pub mod catalog_service;
pub mod error;
pub mod progress_service;
pub mod scoring_service;

pub use quiz_core::Clock;

pub use analytics_service::AnalyticsService;
pub use app_services::AppServices;
pub use auth_service::{AuthService, AuthSettings, Credentials, Registration, Token, TokenIssuer};
pub use catalog_service::{CatalogService, QuestionQuery};
pub use error::{
    AnalyticsError, AppServicesError, AuthError, CatalogError, ProgressError, ScoringError,
};
pub use progress_service::ProgressService;
pub use scoring_service::ScoringService;
