//! User profile handlers

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiResult;
use crate::models::{MessageResponse, ProfileResponse, UpdateProfileRequest};
use crate::state::AppState;

/// GET /user/profile - Profile of the authenticated user
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state.auth_service.get_user(user.user_id).await?;

    Ok(Json(ProfileResponse { user: user.into() }))
}

/// PATCH /user/profile - Update name and/or phone
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    state
        .auth_service
        .update_profile(user.user_id, req.name.as_deref(), req.phone.as_deref())
        .await?;

    Ok(Json(MessageResponse::new("User updated successfully")))
}
