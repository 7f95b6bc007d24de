//! Authentication HTTP handlers
//!
//! Endpoints for OTP signup, login and logout.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiResult;
use crate::models::{LoginRequest, MessageResponse, SignupRequest, TokenResponse, VerifyOtpRequest};
use crate::state::AppState;

/// POST /user/signup - Begin signup and send an OTP
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    state.auth_service.begin_signup(req).await?;

    Ok(Json(MessageResponse::new(
        "OTP sent successfully, please verify OTP",
    )))
}

/// POST /user/verification - Verify the OTP and create the user
pub async fn verify_otp(
    State(state): State<AppState>,
    payload: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = payload?;

    state.auth_service.verify_otp(&req.email, &req.otp).await?;

    Ok(Json(MessageResponse::new("User created successfully")))
}

/// POST /user/login - Check credentials and issue a token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(req) = payload?;

    let token = state.auth_service.login(&req.email, &req.password).await?;

    Ok(Json(TokenResponse { token }))
}

/// POST /user/logout - Revoke the presented token
pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<MessageResponse>> {
    state.token_validator.revoke(&user.token).await;

    tracing::info!(user_id = user.user_id, "User logged out");

    Ok(Json(MessageResponse::new("Logged out successfully")))
}
