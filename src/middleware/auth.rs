//! Authentication middleware
//!
//! Extractor that runs the token gate for routes requiring the `user` role.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use crate::auth::{AuthorizeError, TokenValidator};
use crate::error::ApiError;
use crate::models::ROLE_USER;

/// Authenticated user extracted from the `Authorization` header
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub email: String,
    /// The presented token, needed for logout
    pub token: String,
}

/// Read the token from `Authorization: <token>`, tolerating a `Bearer ` prefix.
/// A header that is present but not text cannot hold a token.
fn token_from_parts(parts: &Parts) -> Result<Option<&str>, AuthorizeError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AuthorizeError::InvalidSignatureOrFormat)?
        .trim_start();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    Ok((!token.is_empty()).then_some(token))
}

/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, user {}", user.user_id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<TokenValidator>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let validator = Arc::<TokenValidator>::from_ref(state);

        let identity = validator
            .authorize(token_from_parts(parts)?, ROLE_USER)
            .await?;

        Ok(AuthenticatedUser {
            user_id: identity.user_id,
            email: identity.email,
            token: identity.token,
        })
    }
}
