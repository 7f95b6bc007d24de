//! Per-request token authorization
//!
//! Checks run in a fixed order and stop at the first failure: presence, revocation,
//! signature and expiry, then role. No store lookup is involved.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use super::jwt::{verify_token, JwtError};
use super::revocation::RevocationStore;

/// Token gate failures
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthorizeError {
    #[error("Token not provided")]
    MissingToken,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Invalid token")]
    InvalidSignatureOrFormat,

    #[error("Role '{required}' required")]
    Forbidden { required: String },
}

/// Identity decoded from an accepted token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub user_id: i64,
    pub email: String,
    pub role: String,
    /// The raw token, kept so the holder can revoke it
    pub token: String,
}

/// Validates tokens against the signing secret and a revocation store
pub struct TokenValidator {
    secret: String,
    revocations: Arc<dyn RevocationStore>,
}

impl TokenValidator {
    pub fn new(secret: impl Into<String>, revocations: Arc<dyn RevocationStore>) -> Self {
        Self {
            secret: secret.into(),
            revocations,
        }
    }

    /// Authorize `token` for `required_role` at the current time
    pub async fn authorize(
        &self,
        token: Option<&str>,
        required_role: &str,
    ) -> Result<AuthIdentity, AuthorizeError> {
        self.authorize_at(token, required_role, Utc::now()).await
    }

    pub async fn authorize_at(
        &self,
        token: Option<&str>,
        required_role: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthIdentity, AuthorizeError> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AuthorizeError::MissingToken),
        };

        if self.revocations.contains(token).await {
            return Err(AuthorizeError::Revoked);
        }

        let claims = verify_token(token, &self.secret, now).map_err(|e| {
            match &e {
                JwtError::TokenExpired => tracing::debug!("Rejected expired token"),
                _ => tracing::debug!(error = %e, "Rejected malformed token"),
            }
            AuthorizeError::InvalidSignatureOrFormat
        })?;

        if claims.role != required_role {
            return Err(AuthorizeError::Forbidden {
                required: required_role.to_string(),
            });
        }

        Ok(AuthIdentity {
            user_id: claims.id,
            email: claims.email,
            role: claims.role,
            token: token.to_string(),
        })
    }

    /// Reject `token` from now on, whatever its expiry
    pub async fn revoke(&self, token: &str) {
        self.revocations.add(token).await;
        tracing::info!("Token revoked");
    }
}
