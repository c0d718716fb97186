use std::env;

/// Token signing settings, handed to the security service at startup.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 secret for short-lived access tokens
    pub access_secret: String,
    /// HS256 secret for long-lived refresh tokens
    pub refresh_secret: String,
    /// Access token lifetime in seconds
    pub access_ttl_secs: i64,
    /// Refresh token (and cookie) lifetime in seconds
    pub refresh_ttl_secs: i64,
    /// Set the Secure attribute on the refresh cookie
    pub cookie_secure: bool,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            access_secret: env::var("QUORUM_JWT_ACCESS_SECRET")
                .unwrap_or_else(|_| "dev-access-secret".to_string()),
            refresh_secret: env::var("QUORUM_JWT_REFRESH_SECRET")
                .unwrap_or_else(|_| "dev-refresh-secret".to_string()),
            access_ttl_secs: env::var("QUORUM_ACCESS_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(900), // 15 minutes
            refresh_ttl_secs: env::var("QUORUM_REFRESH_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(604800), // 7 days
            cookie_secure: env::var("QUORUM_COOKIE_SECURE")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
        }
    }
}
