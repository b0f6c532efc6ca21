//! JSON file marker store.
//!
//! Markers are dot-prefixed siblings of their targets holding a pretty-printed
//! [`MarkerRecord`]. Nothing reads the body back; it is there for operators.

use std::path::Path;
use convy_core::MarkerRecord;
use super::{marker_path, MarkerStore, Result};
use tokio::fs;
use tracing::debug;

/// Filesystem-backed marker store.
#[derive(Debug, Clone, Default)]
pub struct JsonMarkerStore;

impl JsonMarkerStore {
    /// Create a store.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl MarkerStore for JsonMarkerStore {
    async fn exists(&self, target: &Path) -> Result<bool> {
        match fs::symlink_metadata(marker_path(target)).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, target: &Path, record: &MarkerRecord) -> Result<()> {
        let path = marker_path(target);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json.as_bytes()).await?;
        debug!("Wrote marker {}", path.display());
        Ok(())
    }

    async fn clear(&self, target: &Path) -> Result<bool> {
        match fs::remove_file(marker_path(target)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
