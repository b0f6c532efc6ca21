//! Notification channels.

use async_trait::async_trait;
use convy_core::{Notification, NotifyContext, PushoverCredentials};
use std::time::Duration;
use tracing::{debug, info};

/// Pushover message API.
pub const PUSHOVER_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";

/// Errors from sending a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("notification rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
}

/// Delivers operator notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `notification` to the destinations configured in `context`.
    async fn notify(&self, context: &NotifyContext, notification: &Notification) -> Result<(), NotifyError>;
}

/// Sends through the Pushover API when the context carries credentials.
#[derive(Debug, Clone)]
pub struct PushoverNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl PushoverNotifier {
    /// Create a notifier with a 10 second request timeout.
    pub fn new() -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint: PUSHOVER_ENDPOINT.to_string(),
        })
    }

    /// Post to a different endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Form fields for one message.
    fn form(credentials: &PushoverCredentials, notification: &Notification) -> [(&'static str, String); 4] {
        [
            ("token", credentials.api.clone()),
            ("user", credentials.user.clone()),
            ("title", notification.title.clone()),
            ("message", notification.message.clone()),
        ]
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn notify(&self, context: &NotifyContext, notification: &Notification) -> Result<(), NotifyError> {
        let Some(credentials) = context.pushover() else {
            debug!("No pushover credentials, dropping notification: {}", notification.title);
            return Ok(());
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .form(&Self::form(&credentials, notification))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }

        Ok(())
    }
}

/// Writes notifications to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, _context: &NotifyContext, notification: &Notification) -> Result<(), NotifyError> {
        info!("{}: {}", notification.title, notification.message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields() {
        let creds = PushoverCredentials {
            user: "u-key".to_string(),
            api: "a-token".to_string(),
        };
        let form = PushoverNotifier::form(&creds, &Notification::new("convy: encoded", "a.mkv"));
        assert_eq!(form[0], ("token", "a-token".to_string()));
        assert_eq!(form[1], ("user", "u-key".to_string()));
        assert_eq!(form[2].1, "convy: encoded");
        assert_eq!(form[3].1, "a.mkv");
    }

    #[tokio::test]
    async fn test_unconfigured_context_sends_nothing() {
        // Endpoint is unroutable; reaching it would fail the test.
        let notifier = PushoverNotifier::new().unwrap().with_endpoint("http://127.0.0.1:9/");
        let result = notifier
            .notify(&NotifyContext::default(), &Notification::new("t", "m"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let result = LogNotifier.notify(&NotifyContext::default(), &Notification::new("t", "m")).await;
        assert!(result.is_ok());
    }
}
