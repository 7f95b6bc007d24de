//! OTP delivery
//!
//! Codes are handed to a background worker over a channel so a slow or failing
//! mail provider never holds up the signup request. The worker retries on its own.

use axum::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::MailConfig;

/// Delivery errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Mail request failed: {0}")]
    Transport(String),

    #[error("Mail provider rejected message (status={status}): {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        NotifyError::Transport(e.to_string())
    }
}

/// Sends a verification code to an email address
#[async_trait]
pub trait OtpNotifier: Send + Sync {
    async fn send_otp(&self, email: &str, code: &str) -> Result<(), NotifyError>;
}

/// Writes codes to the log; for development only
pub struct LogNotifier;

#[async_trait]
impl OtpNotifier for LogNotifier {
    async fn send_otp(&self, email: &str, code: &str) -> Result<(), NotifyError> {
        tracing::debug!(email = %email, otp = %code, "OTP generated (log delivery)");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MailAddress {
    email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailBody {
    sender: MailAddress,
    to: Vec<MailAddress>,
    subject: String,
    text_content: String,
}

/// Delivers codes through a transactional mail HTTP API
pub struct MailApiNotifier {
    client: reqwest::Client,
    config: MailConfig,
}

impl MailApiNotifier {
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl OtpNotifier for MailApiNotifier {
    async fn send_otp(&self, email: &str, code: &str) -> Result<(), NotifyError> {
        let body = SendMailBody {
            sender: MailAddress {
                email: self.config.sender_email.clone(),
            },
            to: vec![MailAddress {
                email: email.to_string(),
            }],
            subject: "Your PlayArena verification code".to_string(),
            text_content: format!("Your verification code is {}.", code),
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("api-key", &self.config.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Worker retry behaviour
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before attempt `n + 1` is `backoff * n`
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug)]
struct OtpMessage {
    email: String,
    code: String,
}

/// Handle for queueing OTP deliveries onto the background worker
#[derive(Clone)]
pub struct OtpDispatcher {
    tx: mpsc::UnboundedSender<OtpMessage>,
}

impl OtpDispatcher {
    /// Spawn the delivery worker. Must be called inside a tokio runtime.
    pub fn spawn(notifier: Arc<dyn OtpNotifier>, policy: RetryPolicy) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<OtpMessage>();

        tokio::spawn(async move {
            tracing::info!("OTP delivery worker started");
            while let Some(message) = rx.recv().await {
                deliver_with_retry(notifier.as_ref(), &message, policy).await;
            }
            tracing::info!("OTP delivery worker stopped");
        });

        Self { tx }
    }

    /// Queue a delivery; never blocks and never fails the caller
    pub fn dispatch(&self, email: &str, code: &str) {
        let message = OtpMessage {
            email: email.to_string(),
            code: code.to_string(),
        };

        if self.tx.send(message).is_err() {
            tracing::error!(email = %email, "OTP delivery worker is not running; code not sent");
        }
    }
}

async fn deliver_with_retry(notifier: &dyn OtpNotifier, message: &OtpMessage, policy: RetryPolicy) {
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match notifier.send_otp(&message.email, &message.code).await {
            Ok(()) => {
                tracing::info!(email = %message.email, attempt, "OTP delivered");
                return;
            }
            Err(e) if attempt < max_attempts => {
                tracing::warn!(email = %message.email, attempt, error = %e, "OTP delivery failed, retrying");
                tokio::time::sleep(policy.backoff * attempt).await;
            }
            Err(e) => {
                tracing::error!(email = %message.email, attempt, error = %e, "OTP delivery failed, giving up");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyNotifier {
        failures_left: AtomicU32,
        calls: AtomicU32,
        delivered: mpsc::UnboundedSender<(String, String)>,
    }

    #[async_trait]
    impl OtpNotifier for FlakyNotifier {
        async fn send_otp(&self, email: &str, code: &str) -> Result<(), NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures_left.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures_left.store(remaining - 1, Ordering::SeqCst);
                return Err(NotifyError::Transport("connection reset".to_string()));
            }
            let _ = self.delivered.send((email.to_string(), code.to_string()));
            Ok(())
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_dispatch_delivers_in_background() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = Arc::new(FlakyNotifier {
            failures_left: AtomicU32::new(0),
            calls: AtomicU32::new(0),
            delivered: tx,
        });

        let dispatcher = OtpDispatcher::spawn(notifier, fast_policy());
        dispatcher.dispatch("a@b.com", "123456");

        let delivered = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(delivered, ("a@b.com".to_string(), "123456".to_string()));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = Arc::new(FlakyNotifier {
            failures_left: AtomicU32::new(2),
            calls: AtomicU32::new(0),
            delivered: tx,
        });

        let dispatcher = OtpDispatcher::spawn(notifier.clone(), fast_policy());
        dispatcher.dispatch("a@b.com", "654321");

        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let notifier = Arc::new(FlakyNotifier {
            failures_left: AtomicU32::new(10),
            calls: AtomicU32::new(0),
            delivered: tx,
        });

        deliver_with_retry(
            notifier.as_ref(),
            &OtpMessage {
                email: "a@b.com".to_string(),
                code: "000000".to_string(),
            },
            fast_policy(),
        )
        .await;

        assert_eq!(notifier.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        assert!(LogNotifier.send_otp("a@b.com", "123456").await.is_ok());
    }
}
