//! Centralized API error handling for PlayArena
//!
//! Every failure is translated here into an HTTP status code and a JSON body of
//! the form `{"error": {"code": ..., "message": ...}}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::{AuthorizeError, LoginError, SignupError};
use crate::competition::CompetitionError;
use crate::db::StoreError;

/// Body message for 5xx responses; the cause is only logged
const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("OTP expired")]
    Expired,

    #[error("OTP does not match")]
    Mismatch,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Token not provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Expired => "OTP_EXPIRED",
            ApiError::Mismatch => "OTP_MISMATCH",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::MissingToken => "MISSING_TOKEN",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::Revoked => "TOKEN_REVOKED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Expired => StatusCode::GONE,
            ApiError::Mismatch => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_)
            | ApiError::MissingToken
            | ApiError::InvalidToken
            | ApiError::Revoked => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show the client
    pub fn public_message(&self) -> String {
        match self {
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => {
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code = %error_code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = %error_code, "Client error occurred");
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<SignupError> for ApiError {
    fn from(err: SignupError) -> Self {
        match err {
            SignupError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            SignupError::Conflict => ApiError::Conflict("This user already exists".to_string()),
            SignupError::NotFound => ApiError::NotFound("No pending verification".to_string()),
            SignupError::Expired => ApiError::Expired,
            SignupError::Mismatch => ApiError::Mismatch,
            SignupError::Store(e) => e.into(),
        }
    }
}

impl From<AuthorizeError> for ApiError {
    fn from(err: AuthorizeError) -> Self {
        match err {
            AuthorizeError::MissingToken => ApiError::MissingToken,
            AuthorizeError::Revoked => ApiError::Revoked,
            AuthorizeError::InvalidSignatureOrFormat => ApiError::InvalidToken,
            AuthorizeError::Forbidden { required } => {
                ApiError::Forbidden(format!("role '{}' required", required))
            }
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidCredentials => {
                ApiError::Unauthorized("incorrect email or password".to_string())
            }
            LoginError::UserNotFound => ApiError::NotFound("User not found".to_string()),
            LoginError::Hashing(msg) => ApiError::InternalError(msg),
            LoginError::Token(e) => ApiError::InternalError(e.to_string()),
            LoginError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => ApiError::Conflict("This user already exists".to_string()),
            StoreError::Missing => ApiError::NotFound("Record not found".to_string()),
            StoreError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}

impl From<CompetitionError> for ApiError {
    fn from(err: CompetitionError) -> Self {
        match err {
            CompetitionError::LeagueNotFound
            | CompetitionError::TournamentNotFound
            | CompetitionError::UserNotFound => ApiError::NotFound(err.to_string()),
            CompetitionError::Conflict(_) => ApiError::Conflict(err.to_string()),
            CompetitionError::Store(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::Expired.error_code(), "OTP_EXPIRED");
        assert_eq!(ApiError::Mismatch.error_code(), "OTP_MISMATCH");
        assert_eq!(ApiError::Revoked.error_code(), "TOKEN_REVOKED");
        assert_eq!(
            ApiError::Conflict("dup".to_string()).error_code(),
            "CONFLICT"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Expired.status_code(), StatusCode::GONE);
        assert_eq!(
            ApiError::Forbidden("admin".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::DatabaseError("down".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_signup_error_mapping() {
        assert!(matches!(
            ApiError::from(SignupError::Conflict),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(SignupError::Store(StoreError::Duplicate)),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(SignupError::Store(StoreError::Database("x".into()))),
            ApiError::DatabaseError(_)
        ));
    }

    #[test]
    fn test_login_error_mapping() {
        let err = ApiError::from(LoginError::InvalidCredentials);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(err.to_string().contains("incorrect email or password"));
    }

    #[test]
    fn test_authorize_error_mapping() {
        let err = ApiError::from(AuthorizeError::Forbidden {
            required: "admin".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("admin"));
    }

    #[test]
    fn test_server_errors_hide_cause_from_client() {
        let err = ApiError::from(StoreError::Database(
            "connection refused (os error 111) at 10.0.0.5:5432".to_string(),
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);
        assert!(err.to_string().contains("10.0.0.5"));

        let err = ApiError::InternalError("jwt encoding failed".to_string());
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);

        let err = ApiError::NotFound("league not found".to_string());
        assert_eq!(err.public_message(), "Not found: league not found");
    }

    #[test]
    fn test_competition_error_mapping() {
        let err = ApiError::from(CompetitionError::Conflict("league"));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.to_string().contains("this league already exists"));

        let err = ApiError::from(CompetitionError::TournamentNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
