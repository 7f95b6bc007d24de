//! Authentication service
//!
//! Signup runs through a per-email state machine: no pending OTP, OTP pending,
//! verified. Login checks the stored bcrypt hash and issues a token.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::{PendingOtp, SignupRequest, User, ROLE_USER};

use super::jwt::{JwtError, TokenIssuer};
use super::notifier::OtpDispatcher;
use super::otp::OtpGenerator;
use super::store::CredentialStore;

/// Signup and verification errors
#[derive(Error, Debug)]
pub enum SignupError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("User already exists")]
    Conflict,

    #[error("No pending OTP for this email")]
    NotFound,

    #[error("OTP expired")]
    Expired,

    #[error("OTP does not match")]
    Mismatch,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Login and profile errors
#[derive(Error, Debug)]
pub enum LoginError {
    #[error("incorrect email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Password check failed: {0}")]
    Hashing(String),

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create-or-refresh rounds before a signup racing other writers gives up
const PENDING_WRITE_ATTEMPTS: usize = 3;

/// Lifetimes and sizes governing signup
#[derive(Debug, Clone, Copy)]
pub struct SignupPolicy {
    pub otp_length: usize,
    pub otp_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl Default for SignupPolicy {
    fn default() -> Self {
        Self {
            otp_length: 6,
            otp_ttl: Duration::minutes(5),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Authentication service
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    otp_generator: OtpGenerator,
    issuer: TokenIssuer,
    dispatcher: OtpDispatcher,
    policy: SignupPolicy,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        otp_generator: OtpGenerator,
        issuer: TokenIssuer,
        dispatcher: OtpDispatcher,
        policy: SignupPolicy,
    ) -> Self {
        Self {
            store,
            otp_generator,
            issuer,
            dispatcher,
            policy,
        }
    }

    /// Start (or restart) signup for `request.email` and queue the OTP for delivery
    pub async fn begin_signup(&self, request: SignupRequest) -> Result<(), SignupError> {
        self.begin_signup_at(request, Utc::now()).await
    }

    pub async fn begin_signup_at(
        &self,
        request: SignupRequest,
        now: DateTime<Utc>,
    ) -> Result<(), SignupError> {
        if self.store.find_user_by_email(&request.email).await?.is_some() {
            return Err(SignupError::Conflict);
        }

        let password_hash = hash_password(request.password, self.policy.bcrypt_cost).await?;
        let code = self.otp_generator.generate(self.policy.otp_length);

        let pending = PendingOtp {
            id: Uuid::new_v4(),
            email: request.email,
            code,
            expires_at: now + self.policy.otp_ttl,
            name: request.name,
            phone: request.phone,
            password_hash,
            created_at: now,
            updated_at: now,
        };

        self.store_pending(&pending).await?;

        tracing::info!(email = %pending.email, expires_at = %pending.expires_at, "Signup OTP issued");

        self.dispatcher.dispatch(&pending.email, &pending.code);

        Ok(())
    }

    /// Write `pending` as the single pending record for its email.
    ///
    /// Another signup may create the record, or a verification may consume it,
    /// between the lookup and the write. Either way the state is re-read: a
    /// registered email is a conflict, anything else is retried.
    async fn store_pending(&self, pending: &PendingOtp) -> Result<(), SignupError> {
        for _ in 0..PENDING_WRITE_ATTEMPTS {
            let written = match self.store.find_pending_otp(&pending.email).await? {
                Some(_) => self.store.update_pending_otp(pending).await,
                None => self.store.create_pending_otp(pending).await,
            };

            match written {
                Ok(()) => return Ok(()),
                Err(StoreError::Duplicate) | Err(StoreError::Missing) => {
                    if self.store.find_user_by_email(&pending.email).await?.is_some() {
                        return Err(SignupError::Conflict);
                    }
                    tracing::debug!(email = %pending.email, "Pending OTP changed underneath signup, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(SignupError::Store(StoreError::Database(format!(
            "pending OTP for {} kept changing concurrently",
            pending.email
        ))))
    }

    /// Check `code` against the pending OTP for `email` and create the user
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<User, SignupError> {
        self.verify_otp_at(email, code, Utc::now()).await
    }

    pub async fn verify_otp_at(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<User, SignupError> {
        let pending = self
            .store
            .find_pending_otp(email)
            .await?
            .ok_or(SignupError::NotFound)?;

        if pending.is_expired_at(now) {
            return Err(SignupError::Expired);
        }

        if !codes_match(&pending.code, code) {
            tracing::debug!(email = %email, "OTP mismatch");
            return Err(SignupError::Mismatch);
        }

        let user = self.store.complete_signup(&pending.to_new_user()).await?;

        tracing::info!(user_id = user.user_id, email = %user.email, "User registered");

        Ok(user)
    }

    /// Check credentials and issue a `user` token
    pub async fn login(&self, email: &str, password: &str) -> Result<String, LoginError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(LoginError::InvalidCredentials)?;

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            tracing::debug!(email = %email, "Login rejected: wrong password");
            return Err(LoginError::InvalidCredentials);
        }

        let token = self.issuer.issue(user.user_id, &user.email, ROLE_USER)?;

        tracing::info!(user_id = user.user_id, "User logged in");

        Ok(token)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User, LoginError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or(LoginError::UserNotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<User, LoginError> {
        self.store
            .update_user_profile(user_id, name, phone)
            .await?
            .ok_or(LoginError::UserNotFound)
    }
}

fn codes_match(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// bcrypt is CPU-bound, so it runs off the async workers
async fn hash_password(password: String, cost: u32) -> Result<String, SignupError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| SignupError::InvalidInput(format!("error when hashing password: {}", e)))?
        .map_err(|e| SignupError::InvalidInput(format!("error when hashing password: {}", e)))
}

async fn verify_password(password: String, hash: String) -> Result<bool, LoginError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| LoginError::Hashing(e.to_string()))?
        .map_err(|e| LoginError::Hashing(e.to_string()))
}
