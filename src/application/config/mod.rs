pub mod auth;
pub mod database;
pub mod oauth;
pub mod server;

use std::env;

/// Application configuration loaded from environment variables
///
/// Built once in the bootstrapper and carried inside `AppState`; the auth
/// and OAuth components receive their settings explicitly rather than
/// reading process-global state.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub database: database::DatabaseConfig,
    pub auth: auth::AuthConfig,
    pub oauth: oauth::OauthConfig,

    // Logging
    pub log_level: String,

    // Where the browser client lives (OAuth redirect target)
    pub frontend_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server: server::ServerConfig::from_env(),
            database: database::DatabaseConfig::from_env(),
            auth: auth::AuthConfig::from_env(),
            oauth: oauth::OauthConfig::from_env(),

            log_level: env::var("QUORUM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            frontend_url: env::var("QUORUM_FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        }
    }
}
