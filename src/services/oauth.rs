//! Google OAuth code exchange and userinfo lookup.
//!
//! The provider is an external collaborator; this module only builds the
//! authorize URL and performs the two HTTPS calls of the code flow.

use serde::Deserialize;

use crate::config::oauth::OauthConfig;
use crate::error::{AppError, Result};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Deserialize)]
pub struct GoogleTokens {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    /// Stable Google account id
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Build the Google authorization redirect URL
pub fn authorize_url(config: &OauthConfig) -> Result<String> {
    let client_id = config
        .google_client_id
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Google login is not configured".to_string()))?;

    let url = reqwest::Url::parse_with_params(
        GOOGLE_AUTH_URL,
        &[
            ("client_id", client_id),
            ("redirect_uri", config.google_redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("prompt", "select_account"),
        ],
    )
    .map_err(|e| AppError::Internal(format!("Failed to build authorize URL: {}", e)))?;

    Ok(url.to_string())
}

/// Exchange an authorization code for provider tokens
pub async fn exchange_code(config: &OauthConfig, code: &str) -> Result<GoogleTokens> {
    let client_id = config
        .google_client_id
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Google login is not configured".to_string()))?;
    let client_secret = config
        .google_client_secret
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Google login is not configured".to_string()))?;

    let client = reqwest::Client::new();
    let response = client
        .post(GOOGLE_TOKEN_URL)
        .form(&[
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", config.google_redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(AppError::Unauthorized(
            "Google code exchange failed".to_string(),
        ));
    }

    Ok(response.json().await?)
}

/// Fetch the Google profile for an exchanged access token
pub async fn fetch_userinfo(access_token: &str) -> Result<GoogleUserInfo> {
    let client = reqwest::Client::new();
    let response = client
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(AppError::Unauthorized(
            "Failed to fetch Google user info".to_string(),
        ));
    }

    Ok(response.json().await?)
}
