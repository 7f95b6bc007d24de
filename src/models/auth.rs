//! Authentication request/response DTOs for PlayArena

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::UserResponse;

/// Request to begin signup
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

/// Request to verify a signup OTP
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Profile edit; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Profile response
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_request_validation() {
        let ok = SignupRequest {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: String::new(),
            password: "secret1".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = SignupRequest {
            email: "not-an-email".to_string(),
            ..ok
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_signup_request_short_password() {
        let req = SignupRequest {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: String::new(),
            password: "abc".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_profile_rejects_empty_name() {
        let req = UpdateProfileRequest {
            name: Some(String::new()),
            phone: None,
        };
        assert!(req.validate().is_err());

        let req = UpdateProfileRequest {
            name: None,
            phone: Some("555".to_string()),
        };
        assert!(req.validate().is_ok());
    }
}
