//! Operator notifications.
//!
//! Delivery is best-effort: callers log and drop any [`NotifyError`].

#![warn(missing_docs)]

pub mod channel;

pub use channel::{LogNotifier, Notifier, NotifyError, PushoverNotifier, PUSHOVER_ENDPOINT};
