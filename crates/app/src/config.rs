use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::Duration;
use services::AuthSettings;

pub const DEV_SECRET_KEY: &str = "dev-secret-key-change-in-production";

const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:3001",
    "https://localhost:3000",
    "https://localhost:3001",
];

/// Process configuration, read once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub bcrypt_cost: u32,
    pub api_prefix: String,
    pub project_name: String,
    pub environment: String,
    pub cors_origins: Vec<String>,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values fall back to
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cors_origins = var("BACKEND_CORS_ORIGINS").map_or_else(
            || DEFAULT_CORS_ORIGINS.iter().map(|s| (*s).to_owned()).collect(),
            |raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            },
        );

        Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| "sqlite://quiz.sqlite3".into()),
            host: var("HOST")
                .and_then(|v| v.parse().ok())
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port: var("PORT").and_then(|v| v.parse().ok()).unwrap_or(8000),
            log_level: var("RUST_LOG").unwrap_or_else(|| "info".into()),
            secret_key: var("SECRET_KEY").unwrap_or_else(|| DEV_SECRET_KEY.into()),
            access_token_expire_minutes: var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .and_then(|v| v.parse().ok())
                .filter(|m| *m > 0)
                .unwrap_or(30),
            bcrypt_cost: var("BCRYPT_COST")
                .and_then(|v| v.parse().ok())
                .unwrap_or(bcrypt::DEFAULT_COST),
            api_prefix: var("API_V1_STR").unwrap_or_else(|| "/api/v1".into()),
            project_name: var("PROJECT_NAME").unwrap_or_else(|| "Quiz API".into()),
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".into()),
            cors_origins,
        }
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub fn uses_dev_secret(&self) -> bool {
        self.secret_key == DEV_SECRET_KEY
    }

    #[must_use]
    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            secret: self.secret_key.clone(),
            token_ttl: Duration::minutes(self.access_token_expire_minutes),
            bcrypt_cost: self.bcrypt_cost,
        }
    }
}
