use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::auth::AuthConfig;
use crate::error::{AppError, Result};
use crate::models::user;

/// JWT token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user id)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>, // JWT ID for uniqueness
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>, // "refresh" for refresh tokens
}

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Create a short-lived access token for a user
pub fn create_access_token(config: &AuthConfig, user: &user::Model) -> Result<String> {
    let now = Utc::now();
    let exp = now + Duration::seconds(config.access_ttl_secs);

    let claims = Claims {
        sub: user.id.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
        jti: Some(uuid::Uuid::new_v4().to_string()),
        is_admin: Some(user.is_admin),
        token_type: None,
    };

    let encoding_key = EncodingKey::from_secret(config.access_secret.as_bytes());
    let header = Header::new(Algorithm::HS256);
    encode(&header, &claims, &encoding_key).map_err(|e| e.into())
}

/// Create a long-lived refresh token (no role embedded - only for token refresh)
pub fn create_refresh_token(config: &AuthConfig, user_id: i64) -> Result<String> {
    let now = Utc::now();
    let exp = now + Duration::seconds(config.refresh_ttl_secs);

    let claims = Claims {
        sub: user_id.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
        jti: Some(uuid::Uuid::new_v4().to_string()),
        is_admin: None,
        token_type: Some("refresh".to_string()),
    };

    let encoding_key = EncodingKey::from_secret(config.refresh_secret.as_bytes());
    let header = Header::new(Algorithm::HS256);
    encode(&header, &claims, &encoding_key).map_err(|e| e.into())
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    // No clock skew tolerance for expiration check
    validation.leeway = 0;
    validation
}

/// Decode and validate an access token. Refresh tokens are rejected.
pub fn decode_access_token(config: &AuthConfig, token: &str) -> Result<Claims> {
    let decoding_key = DecodingKey::from_secret(config.access_secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &validation())?;

    if token_data.claims.token_type.as_deref() == Some("refresh") {
        return Err(AppError::Unauthorized(
            "Refresh tokens cannot be used for API access".to_string(),
        ));
    }

    Ok(token_data.claims)
}

/// Decode and validate a refresh token. Access tokens are rejected.
pub fn decode_refresh_token(config: &AuthConfig, token: &str) -> Result<Claims> {
    let decoding_key = DecodingKey::from_secret(config.refresh_secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &validation())?;

    if token_data.claims.token_type.as_deref() != Some("refresh") {
        return Err(AppError::Unauthorized("Not a refresh token".to_string()));
    }

    Ok(token_data.claims)
}
