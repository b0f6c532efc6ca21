//! Convy core data models.
//!
//! This crate defines the configuration tree, quality tiers, settings
//! layers and the records exchanged between the scheduler and its
//! collaborators (prober, encoder, notifier, marker store).

#![warn(missing_docs)]

// Directory configuration
mod mode;
mod node;
mod settings;

// Quality ladder
mod tier;

// Work and outcomes
mod request;
mod marker;
mod notify;

// Re-exports
pub use mode::Mode;
pub use node::{ConfigNode, ConfigTree, Item, ItemKind, NodeId};
pub use settings::{keys, parse_bool, Layer, ResolvedSettings, Section};
pub use tier::{classify_tier, expand_ladder, LadderError, Tier};
pub use request::{EncodeRequest, Pass, RungOutput};
pub use marker::{MarkerKind, MarkerRecord};
pub use notify::{Notification, NotifyContext, PushoverCredentials};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;

/// File extensions treated as video sources.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "mov", "wmv", "flv", "webm", "mpeg", "mpg", "ts", "m2ts",
];

/// Whether a path names a video file by extension.
pub fn is_video_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
