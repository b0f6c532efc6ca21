//! Operator retry: clearing settled markers.

use convy_config::DESCRIPTOR_FILE;
use convy_storage::{MarkerStore, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::command::source_name;

/// Clear the marker of `path` so the next cycle looks at it again.
///
/// When `path` is a rung target, the markers of the item that owns it are
/// cleared too: the source file's own marker and, for movie folders and
/// seasons, the folder's marker. Otherwise the owner would keep the rung
/// from ever being rebuilt. Managed directories (those with a descriptor)
/// are never treated as owners.
///
/// Returns the paths whose markers were removed.
pub async fn clear_settlement(markers: &dyn MarkerStore, path: &Path) -> Result<Vec<PathBuf>> {
    let mut cleared = Vec::new();
    if markers.clear(path).await? {
        cleared.push(path.to_path_buf());
    }

    let Some(name) = source_name(path) else {
        return Ok(cleared);
    };
    let Some(dir) = owning_dir(path, &name).await else {
        return Ok(cleared);
    };

    let source = dir.join(&name);
    if markers.clear(&source).await? {
        cleared.push(source);
    }
    let managed = tokio::fs::try_exists(dir.join(DESCRIPTOR_FILE)).await.unwrap_or(false);
    if !managed && markers.clear(&dir).await? {
        cleared.push(dir);
    }

    for p in &cleared {
        info!("Cleared marker of {}", p.display());
    }
    Ok(cleared)
}

/// Nearest ancestor of `target` holding a file called `name`.
async fn owning_dir(target: &Path, name: &str) -> Option<PathBuf> {
    for dir in target.ancestors().skip(1) {
        if dir.as_os_str().is_empty() {
            break;
        }
        let meta = tokio::fs::metadata(dir.join(name)).await;
        if meta.map(|m| m.is_file()).unwrap_or(false) {
            return Some(dir.to_path_buf());
        }
    }
    None
}
