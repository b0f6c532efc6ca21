//! One-shot marker report over managed trees.

use convy_config::SettingsResolver;
use convy_core::{is_video_file, ConfigTree, Mode};
use convy_storage::{MarkerStore, Result};
use std::fmt;
use std::path::PathBuf;

use crate::traversal::{is_output_dir, item_units, list_videos, output_dir_names};

/// Granularity of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// A movie, movie folder, or loose episode
    Item,
    /// A season folder
    Season,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::Item => f.pad("item"),
            StatusKind::Season => f.pad("season"),
        }
    }
}

/// One reported item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Item path
    pub path: PathBuf,
    /// Item or season
    pub kind: StatusKind,
    /// Whether its top-level marker exists
    pub settled: bool,
}

/// Items of every managed leaf, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// All entries
    pub entries: Vec<StatusEntry>,
}

impl StatusReport {
    /// Entries with a marker.
    pub fn settled(&self) -> usize {
        self.entries.iter().filter(|e| e.settled).count()
    }

    /// Entries still waiting.
    pub fn pending(&self) -> usize {
        self.entries.len() - self.settled()
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let state = if entry.settled { "settled" } else { "pending" };
            writeln!(f, "{:<8} {:<7} {}", state, entry.kind, entry.path.display())?;
        }
        write!(f, "{} settled, {} pending", self.settled(), self.pending())
    }
}

/// Report the top-level marker state of every item, without probing.
///
/// Rung markers are not inspected; an item whose rungs are all settled but
/// whose own marker is not yet written shows as pending until the next cycle
/// writes it.
pub async fn collect_status(trees: &[ConfigTree], markers: &dyn MarkerStore) -> Result<StatusReport> {
    let mut report = StatusReport::default();

    for tree in trees {
        let resolver = SettingsResolver::new(tree);
        for id in tree.depth_first() {
            let node = tree.get(id);
            let outputs = match node.mode {
                Mode::Movie | Mode::Series => output_dir_names(&resolver, id),
                Mode::Container | Mode::Soundtrack => continue,
            };
            match node.mode {
                Mode::Movie => {
                    for item in &node.items {
                        if is_output_dir(item, &outputs) {
                            continue;
                        }
                        if !item.is_dir() && !is_video_file(&item.path) {
                            continue;
                        }
                        if item_units(item).await?.is_empty() {
                            continue;
                        }
                        report.entries.push(StatusEntry {
                            path: item.path.clone(),
                            kind: StatusKind::Item,
                            settled: markers.exists(&item.path).await?,
                        });
                    }
                }
                Mode::Series => {
                    for item in &node.items {
                        if is_output_dir(item, &outputs) {
                            continue;
                        }
                        let kind = if item.is_dir() {
                            if list_videos(&item.path).await?.is_empty() {
                                continue;
                            }
                            StatusKind::Season
                        } else if is_video_file(&item.path) {
                            StatusKind::Item
                        } else {
                            continue;
                        };
                        report.entries.push(StatusEntry {
                            path: item.path.clone(),
                            kind,
                            settled: markers.exists(&item.path).await?,
                        });
                    }
                }
                Mode::Container | Mode::Soundtrack => {}
            }
        }
    }

    Ok(report)
}
