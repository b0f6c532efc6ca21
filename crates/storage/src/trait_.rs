//! Marker store abstraction.

use async_trait::async_trait;
use convy_core::MarkerRecord;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during marker operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Marker path for `target`: the same directory, basename prefixed with a dot.
pub fn marker_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    if let Some(file_name) = target.file_name() {
        name.push(file_name);
    }
    match target.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Durable "already handled" tokens keyed by target path.
///
/// Existence is the only signal. Writes overwrite unconditionally and take no
/// locks; a single process is assumed to be the only writer.
#[async_trait]
pub trait MarkerStore: Send + Sync {
    /// Whether `target` has a marker.
    async fn exists(&self, target: &Path) -> Result<bool>;

    /// Write the marker for `target`.
    async fn write(&self, target: &Path, record: &MarkerRecord) -> Result<()>;

    /// Remove the marker for `target`. Returns whether one existed.
    ///
    /// Only operator commands call this; the scheduler never clears markers.
    async fn clear(&self, target: &Path) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_path_is_dot_prefixed_sibling() {
        assert_eq!(
            marker_path(Path::new("/media/movies/Heat.mkv")),
            PathBuf::from("/media/movies/.Heat.mkv")
        );
        assert_eq!(
            marker_path(Path::new("/tv/show/Season 01")),
            PathBuf::from("/tv/show/.Season 01")
        );
    }

    #[test]
    fn test_marker_path_relative() {
        assert_eq!(marker_path(Path::new("a.mkv")), PathBuf::from(".a.mkv"));
    }
}
