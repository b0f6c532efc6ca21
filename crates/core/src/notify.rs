//! Notification payloads and the per-subtree notification context.

use serde::{Deserialize, Serialize};

/// Pushover application token and user key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushoverCredentials {
    /// Recipient user key
    pub user: String,

    /// Application API token
    pub api: String,
}

/// Where notifications for a subtree go.
///
/// Resolved while walking down the tree so no node re-reads its ancestors.
/// Keys are kept separately so a child may override just one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyContext {
    /// Pushover user key in effect
    pub pushover_user: Option<String>,

    /// Pushover API token in effect
    pub pushover_api: Option<String>,
}

impl NotifyContext {
    /// Complete Pushover credentials, if both keys are known.
    pub fn pushover(&self) -> Option<PushoverCredentials> {
        match (&self.pushover_user, &self.pushover_api) {
            (Some(user), Some(api)) => Some(PushoverCredentials {
                user: user.clone(),
                api: api.clone(),
            }),
            _ => None,
        }
    }

    /// Whether any destination is configured.
    pub fn is_configured(&self) -> bool {
        self.pushover().is_some()
    }
}

/// A message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Short title
    pub title: String,

    /// Body text
    pub message: String,
}

impl Notification {
    /// Create a notification.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}
