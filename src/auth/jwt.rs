//! JWT token generation and validation
//!
//! Tokens are HS256-signed and carry the user id, email, role and an absolute expiry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User ID
    pub id: i64,
    /// User email
    pub email: String,
    /// User role
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Mints signed tokens with a fixed lifetime
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, ttl_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Issue a token expiring `ttl` from now
    pub fn issue(&self, user_id: i64, email: &str, role: &str) -> Result<String, JwtError> {
        self.issue_at(user_id, email, role, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        user_id: i64,
        email: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = Claims {
            id: user_id,
            email: email.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }
}

/// Verify and decode a JWT token
///
/// # Arguments
/// * `token` - The JWT token string
/// * `secret` - Signing secret
/// * `now` - Time the expiry is checked against
///
/// # Returns
/// * `Ok(Claims)` if the signature verifies and `exp` is strictly after `now`
/// * `Err(JwtError)` otherwise; a token expiring exactly at `now` is expired
pub fn verify_token(token: &str, secret: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // jsonwebtoken accepts exp == now and applies leeway; expiry is checked below instead.
    validation.validate_exp = false;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| JwtError::DecodingFailed(e.to_string()))?;

    if token_data.claims.exp <= now.timestamp() {
        return Err(JwtError::TokenExpired);
    }

    Ok(token_data.claims)
}
