//! API handlers for PlayArena backend

pub mod auth;
pub mod competition;
pub mod user;

pub use auth::{login, logout, signup, verify_otp};
pub use user::{get_profile, update_profile};

// Re-export AuthenticatedUser from middleware for handler use
pub use crate::middleware::auth::AuthenticatedUser;
