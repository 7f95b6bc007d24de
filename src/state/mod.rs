//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{AuthService, TokenValidator};
use crate::competition::CompetitionService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub token_validator: Arc<TokenValidator>,
    pub competition_service: Arc<CompetitionService>,
}

impl AppState {
    pub fn new(
        auth_service: Arc<AuthService>,
        token_validator: Arc<TokenValidator>,
        competition_service: Arc<CompetitionService>,
    ) -> Self {
        Self {
            auth_service,
            token_validator,
            competition_service,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<TokenValidator> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.token_validator.clone()
    }
}
