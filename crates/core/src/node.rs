//! Configuration tree - one node per managed directory.
//!
//! Nodes live in an arena owned by [`ConfigTree`]. Children are held by index
//! and the parent link is a plain index used only for upward reads.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Mode, Section, Tier};
use crate::settings::keys;

/// Index of a node inside its [`ConfigTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in the arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Subdirectory
    Dir,
    /// Regular file
    File,
}

/// A listed entry of a managed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Entry kind
    pub kind: ItemKind,

    /// File name
    pub name: String,

    /// Full path
    pub path: PathBuf,
}

impl Item {
    /// Whether this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == ItemKind::Dir
    }
}

/// A managed directory and its parsed descriptor.
#[derive(Debug, Clone)]
pub struct ConfigNode {
    /// Directory path
    pub path: PathBuf,

    /// Management mode
    pub mode: Mode,

    /// Descriptor sections in file order
    pub sections: Vec<Section>,

    /// Directory entries, sorted by name, descriptor and dot-entries excluded
    pub items: Vec<Item>,

    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl ConfigNode {
    /// Create a detached node.
    pub fn new(path: impl Into<PathBuf>, mode: Mode, sections: Vec<Section>, items: Vec<Item>) -> Self {
        Self {
            path: path.into(),
            mode,
            sections,
            items,
            children: Vec::new(),
            parent: None,
        }
    }

    /// Find a section by name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// The generic `[settings]` section.
    pub fn generic_settings(&self) -> Option<&Section> {
        self.section(keys::SETTINGS)
    }

    /// `[settings-*]` sections declaring `tier`, in file order.
    pub fn tier_settings(&self, tier: Tier) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .filter(move |s| s.is_tiered() && s.tier() == Some(tier))
    }

    /// Child nodes, in listing order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Parent node, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Directory name.
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Arena-backed tree of managed directories under one root.
#[derive(Debug, Clone)]
pub struct ConfigTree {
    nodes: Vec<ConfigNode>,
}

impl ConfigTree {
    /// Create a tree from its root node.
    pub fn new(mut root: ConfigNode) -> Self {
        root.parent = None;
        Self { nodes: vec![root] }
    }

    /// The root node id.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Attach `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: ConfigNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Borrow a node.
    pub fn get(&self, id: NodeId) -> &ConfigNode {
        &self.nodes[id.0]
    }

    /// Root directory.
    pub fn path(&self) -> &Path {
        &self.nodes[0].path
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `id` and its ancestors, most specific first.
    pub fn ancestry(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = self.nodes[id.0].parent;
        while let Some(p) = current {
            chain.push(p);
            current = self.nodes[p.0].parent;
        }
        chain
    }

    /// Pre-order depth-first walk from the root, children in listing order.
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(path: &str, mode: Mode) -> ConfigNode {
        ConfigNode::new(path, mode, Vec::new(), Vec::new())
    }

    #[test]
    fn test_parent_links_and_ancestry() {
        let mut tree = ConfigTree::new(node("/media", Mode::Container));
        let movies = tree.add_child(tree.root(), node("/media/movies", Mode::Movie));
        let tv = tree.add_child(tree.root(), node("/media/tv", Mode::Container));
        let show = tree.add_child(tv, node("/media/tv/show", Mode::Series));

        assert_eq!(tree.get(movies).parent(), Some(tree.root()));
        assert_eq!(tree.ancestry(show), vec![show, tv, tree.root()]);
        assert_eq!(tree.get(tree.root()).children(), &[movies, tv]);
    }

    #[test]
    fn test_depth_first_order() {
        let mut tree = ConfigTree::new(node("/r", Mode::Container));
        let a = tree.add_child(tree.root(), node("/r/a", Mode::Container));
        let b = tree.add_child(tree.root(), node("/r/b", Mode::Movie));
        let a1 = tree.add_child(a, node("/r/a/1", Mode::Movie));
        let a2 = tree.add_child(a, node("/r/a/2", Mode::Series));

        assert_eq!(tree.depth_first(), vec![tree.root(), a, a1, a2, b]);
    }

    #[test]
    fn test_tier_settings_filter() {
        let mut hd = Section::new("settings-hd");
        hd.insert("tier", "hd");
        let mut uhd = Section::new("settings-uhd");
        uhd.insert("tier", "4k");
        let n = ConfigNode::new("/m", Mode::Movie, vec![Section::new("settings"), hd, uhd], Vec::new());

        let found: Vec<_> = n.tier_settings(Tier::FourK).map(|s| s.name.as_str()).collect();
        assert_eq!(found, vec!["settings-uhd"]);
        assert!(n.generic_settings().is_some());
    }
}
