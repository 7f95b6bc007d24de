//! Authentication module for PlayArena
//!
//! - OTP-verified signup with a per-email pending record
//! - Password login issuing signed, time-limited tokens
//! - Per-request token gate with explicit revocation

mod gate;
mod jwt;
mod notifier;
mod otp;
mod revocation;
mod service;
mod store;

pub use gate::{AuthIdentity, AuthorizeError, TokenValidator};
pub use jwt::{verify_token, Claims, JwtError, TokenIssuer};
pub use notifier::{
    LogNotifier, MailApiNotifier, NotifyError, OtpDispatcher, OtpNotifier, RetryPolicy,
};
pub use otp::OtpGenerator;
pub use revocation::{InMemoryRevocationStore, RevocationStore};
pub use service::{AuthService, LoginError, SignupError, SignupPolicy};
pub use store::{CredentialStore, InMemoryCredentialStore, PgCredentialStore};
