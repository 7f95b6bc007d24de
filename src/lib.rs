//! PlayArena Backend Library
//!
//! User registration with OTP email verification, password login, and
//! token-gated leagues, tournaments and teams for the PlayArena gaming platform.

pub mod auth;
pub mod competition;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
