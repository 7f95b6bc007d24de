//! Route definitions for PlayArena API

mod auth;
mod competition;
mod user;

pub use auth::auth_routes;
pub use competition::competition_routes;
pub use user::user_routes;

use axum::Router;

use crate::middleware;
use crate::state::AppState;

/// All API routes with state applied and request tracing layered on
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(competition_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::request_tracing))
}
