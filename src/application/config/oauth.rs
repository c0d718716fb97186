use std::env;

/// Google OAuth client settings. Login via Google is disabled unless both
/// client id and secret are configured.
#[derive(Debug, Clone)]
pub struct OauthConfig {
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: String,
}

impl OauthConfig {
    pub fn from_env() -> Self {
        Self {
            google_client_id: env::var("QUORUM_GOOGLE_CLIENT_ID").ok(),
            google_client_secret: env::var("QUORUM_GOOGLE_CLIENT_SECRET").ok(),
            google_redirect_uri: env::var("QUORUM_GOOGLE_REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:5000/auth/google/callback".to_string()),
        }
    }

    pub fn google_enabled(&self) -> bool {
        self.google_client_id.is_some() && self.google_client_secret.is_some()
    }
}
