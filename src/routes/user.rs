//! User profile routes

use axum::{routing::get, Router};

use crate::handlers::user;
use crate::state::AppState;

/// Create profile routes; all require a `user` token
pub fn user_routes() -> Router<AppState> {
    Router::new().route(
        "/user/profile",
        get(user::get_profile).patch(user::update_profile),
    )
}
