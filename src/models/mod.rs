//! Data models for PlayArena backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod auth;
pub mod competition;
pub use auth::*;
pub use competition::*;

/// Role embedded in tokens issued at login
pub const ROLE_USER: &str = "user";

/// Role reserved for administrative routes
pub const ROLE_ADMIN: &str = "admin";

/// Registered user
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User fields captured at signup, written when the OTP is verified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
}

/// Pending OTP verification, at most one per email
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct PendingOtp {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PendingOtp {
    /// Whether the code is past its deadline at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// The user record this pending signup turns into
    pub fn to_new_user(&self) -> NewUser {
        NewUser {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            password_hash: self.password_hash.clone(),
        }
    }
}

/// Sanitized user for API responses
#[derive(Debug, Serialize, Clone)]
pub struct UserResponse {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            phone: user.phone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pending(expires_at: DateTime<Utc>) -> PendingOtp {
        let now = Utc::now();
        PendingOtp {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            code: "123456".to_string(),
            expires_at,
            name: "Ana".to_string(),
            phone: "555-0100".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_pending_otp_expiry_is_exclusive_of_deadline() {
        let deadline = Utc::now();
        let otp = pending(deadline);
        assert!(!otp.is_expired_at(deadline));
        assert!(otp.is_expired_at(deadline + Duration::milliseconds(1)));
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let now = Utc::now();
        let user = User {
            user_id: 1,
            name: "Ana".to_string(),
            email: "a@b.com".to_string(),
            phone: String::new(),
            password_hash: "$2b$04$secret".to_string(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("password_hash"));
    }
}
