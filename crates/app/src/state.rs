use std::sync::Arc;

use services::AppServices;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    services: AppServices,
    info: Arc<ServiceInfo>,
}

#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub project_name: String,
    pub environment: String,
}

impl AppState {
    #[must_use]
    pub fn new(services: AppServices, info: ServiceInfo) -> Self {
        Self {
            services,
            info: Arc::new(info),
        }
    }

    #[must_use]
    pub fn services(&self) -> &AppServices {
        &self.services
    }

    #[must_use]
    pub fn info(&self) -> &ServiceInfo {
        &self.info
    }
}
