//! Configuration tree construction.

use convy_core::{ConfigNode, ConfigTree, Item, ItemKind, Mode};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::{ConfigError, Descriptor, Result, DESCRIPTOR_FILE};

/// Builds a [`ConfigTree`] from a managed root directory.
///
/// Containers adopt every subdirectory as a child. A child that fails to
/// build rejects the whole tree; partial trees are never returned.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    descriptor_name: String,
}

impl TreeBuilder {
    /// Create a builder using the standard descriptor name.
    pub fn new() -> Self {
        Self {
            descriptor_name: DESCRIPTOR_FILE.to_string(),
        }
    }

    /// Use a different descriptor file name.
    pub fn with_descriptor_name(mut self, name: impl Into<String>) -> Self {
        self.descriptor_name = name.into();
        self
    }

    /// Build the tree rooted at `root`.
    pub async fn build(&self, root: impl AsRef<Path>) -> Result<ConfigTree> {
        let root = root.as_ref();
        let mut tree = ConfigTree::new(self.load_node(root).await?);
        let mut queue = VecDeque::from([tree.root()]);

        while let Some(id) = queue.pop_front() {
            let node = tree.get(id);
            if node.mode != Mode::Container {
                continue;
            }

            let subdirs: Vec<PathBuf> = node
                .items
                .iter()
                .filter(|item| item.is_dir())
                .map(|item| item.path.clone())
                .collect();

            for dir in subdirs {
                let child = self.load_node(&dir).await.map_err(|e| ConfigError::Subtree {
                    path: dir.clone(),
                    source: Box::new(e),
                })?;
                queue.push_back(tree.add_child(id, child));
            }
        }

        debug!("Built tree for {} with {} node(s)", root.display(), tree.len());
        Ok(tree)
    }

    /// Parse and validate one directory's descriptor and list its entries.
    async fn load_node(&self, dir: &Path) -> Result<ConfigNode> {
        let path = dir.join(&self.descriptor_name);
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NoDescriptor {
                    dir: dir.to_path_buf(),
                })
            }
            Err(e) => return Err(ConfigError::Io { path, source: e }),
        };

        let descriptor = Descriptor::parse(&text, &path)?;
        let mode = descriptor.validate(&path)?;
        let items = self.list_items(dir).await?;

        Ok(ConfigNode::new(dir, mode, descriptor.into_sections(), items))
    }

    /// Directory entries sorted by name, skipping dot-entries and the descriptor.
    async fn list_items(&self, dir: &Path) -> Result<Vec<Item>> {
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut items = Vec::new();
        let mut rd = fs::read_dir(dir).await.map_err(io_err)?;
        while let Some(entry) = rd.next_entry().await.map_err(io_err)? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || name == self.descriptor_name {
                continue;
            }

            let path = entry.path();
            // Follow symlinks so linked season folders count as directories.
            let kind = match fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => ItemKind::Dir,
                Ok(_) => ItemKind::File,
                Err(e) => {
                    debug!("Skipping unreadable entry {}: {}", path.display(), e);
                    continue;
                }
            };
            items.push(Item { kind, name, path });
        }

        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;

    fn write(dir: &Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        stdfs::create_dir_all(path.parent().unwrap()).unwrap();
        stdfs::write(path, body).unwrap();
    }

    #[tokio::test]
    async fn test_no_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let err = TreeBuilder::new().build(dir.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::NoDescriptor { .. }));
    }

    #[tokio::test]
    async fn test_items_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "convy.cfg", "[main]\nmode = movie\n");
        write(dir.path(), "b.mkv", "");
        write(dir.path(), "a.mkv", "");
        write(dir.path(), ".a.mkv", "");
        write(dir.path(), "Extras/x.mkv", "");

        let tree = TreeBuilder::new().build(dir.path()).await.unwrap();
        let root = tree.get(tree.root());
        assert_eq!(root.mode, Mode::Movie);
        let names: Vec<_> = root.items.iter().map(|i| (i.name.as_str(), i.kind)).collect();
        assert_eq!(
            names,
            vec![("Extras", ItemKind::Dir), ("a.mkv", ItemKind::File), ("b.mkv", ItemKind::File)]
        );
        assert_eq!(tree.len(), 1);
    }

    #[tokio::test]
    async fn test_container_adopts_children_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "convy.cfg", "[main]\nmode = subdir\n");
        write(dir.path(), "tv/convy.cfg", "[main]\nmode = subdir\n");
        write(dir.path(), "tv/show/convy.cfg", "[main]\nmode = tv\n");
        write(dir.path(), "movies/convy.cfg", "[main]\nmode = movie\n");
        write(dir.path(), "README.txt", "files in containers are ignored");

        let tree = TreeBuilder::new().build(dir.path()).await.unwrap();
        assert_eq!(tree.len(), 4);

        let root = tree.get(tree.root());
        let names: Vec<_> = root.children().iter().map(|c| tree.get(*c).name()).collect();
        assert_eq!(names, vec!["movies", "tv"]);

        let tv = root.children()[1];
        let show = tree.get(tv).children()[0];
        assert_eq!(tree.get(show).mode, Mode::Series);
        assert_eq!(tree.get(show).parent(), Some(tv));
    }

    #[tokio::test]
    async fn test_child_without_descriptor_rejects_tree() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "convy.cfg", "[main]\nmode = subdir\n");
        write(dir.path(), "ok/convy.cfg", "[main]\nmode = movie\n");
        write(dir.path(), "unmanaged/movie.mkv", "");

        let err = TreeBuilder::new().build(dir.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Subtree { .. }));
        assert!(matches!(err.root_cause(), ConfigError::NoDescriptor { .. }));
    }

    #[tokio::test]
    async fn test_deep_failure_rejects_tree() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "convy.cfg", "[main]\nmode = subdir\n");
        write(dir.path(), "a/convy.cfg", "[main]\nmode = subdir\n");
        write(dir.path(), "a/b/convy.cfg", "[main]\nmode = movie\n[settings-x]\nvideo.bitrate = 1M\n");

        let err = TreeBuilder::new().build(dir.path()).await.unwrap_err();
        assert!(matches!(err.root_cause(), ConfigError::MissingTierKey { .. }));
    }

    #[tokio::test]
    async fn test_movie_subdirs_are_not_built() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "convy.cfg", "[main]\nmode = movie\n");
        write(dir.path(), "Heat (1995)/heat.mkv", "");

        let tree = TreeBuilder::new().build(dir.path()).await.unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[tokio::test]
    async fn test_custom_descriptor_name() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "media.ini", "[main]\nmode = soundtrack\n");

        let tree = TreeBuilder::new()
            .with_descriptor_name("media.ini")
            .build(dir.path())
            .await
            .unwrap();
        assert_eq!(tree.get(tree.root()).mode, Mode::Soundtrack);
        assert!(tree.get(tree.root()).items.is_empty());
    }
}
