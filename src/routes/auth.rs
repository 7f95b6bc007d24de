//! Authentication routes

use axum::{routing::post, Router};

use crate::handlers::auth;
use crate::state::AppState;

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user/signup", post(auth::signup))
        .route("/user/verification", post(auth::verify_otp))
        .route("/user/login", post(auth::login))
        .route("/user/logout", post(auth::logout))
}
