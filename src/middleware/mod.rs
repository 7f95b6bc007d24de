//! Middleware for PlayArena API
//!
//! Request tracing and the authentication extractor.

pub mod auth;
mod tracing;

pub use auth::AuthenticatedUser;
pub use self::tracing::{request_tracing, REQUEST_ID_HEADER};
