use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::analytics_service::AnalyticsService;
use crate::auth_service::{AuthService, AuthSettings};
use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::scoring_service::ScoringService;

/// Assembles every service over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<CatalogService>,
    progress: Arc<ProgressService>,
    scoring: Arc<ScoringService>,
    analytics: Arc<AnalyticsService>,
    auth: Arc<AuthService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, running migrations first.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        auth: &AuthSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock, auth))
    }

    /// Build services over an already-opened storage.
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock, auth: &AuthSettings) -> Self {
        let catalog = Arc::new(CatalogService::new(
            clock,
            Arc::clone(&storage.quiz_sets),
            Arc::clone(&storage.questions),
        ));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.quiz_sets),
            Arc::clone(&storage.progress),
        ));
        let scoring = Arc::new(ScoringService::new(
            clock,
            Arc::clone(&storage.quiz_sets),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.submissions),
        ));
        let analytics = Arc::new(AnalyticsService::new(
            Arc::clone(&storage.quiz_sets),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.attempts),
        ));
        let auth = Arc::new(AuthService::new(clock, Arc::clone(&storage.users), auth));

        Self {
            catalog,
            progress,
            scoring,
            analytics,
            auth,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn scoring(&self) -> Arc<ScoringService> {
        Arc::clone(&self.scoring)
    }

    #[must_use]
    pub fn analytics(&self) -> Arc<AnalyticsService> {
        Arc::clone(&self.analytics)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }
}
