//! Layered settings resolution.
//!
//! Settings are gathered from a node and its ancestors and folded root-first,
//! so a deeper directory's value for a key always beats an ancestor's. Within
//! one directory a matching `[settings-*]` section beats `[settings]`.

use convy_core::{
    keys, parse_bool, ConfigNode, ConfigTree, Layer, NodeId, NotifyContext, ResolvedSettings, Tier,
};

/// Read-only resolver over one tree.
#[derive(Debug, Clone, Copy)]
pub struct SettingsResolver<'a> {
    tree: &'a ConfigTree,
}

impl<'a> SettingsResolver<'a> {
    /// Create a resolver for `tree`.
    pub fn new(tree: &'a ConfigTree) -> Self {
        Self { tree }
    }

    /// Layers applicable to `node` at `tier`, root first.
    pub fn layers(&self, node: NodeId, tier: Tier) -> Vec<Layer> {
        let mut collected = Vec::new();

        // Most specific first; within a node the tier sections are pushed in
        // reverse file order ahead of the generic section.
        for id in self.tree.ancestry(node) {
            let n = self.tree.get(id);
            let tiered: Vec<_> = n.tier_settings(tier).collect();
            for section in tiered.into_iter().rev() {
                collected.push(Layer::from_section(&n.path, section));
            }
            if let Some(generic) = n.generic_settings() {
                collected.push(Layer::from_section(&n.path, generic));
            }
        }

        collected.reverse();
        collected
    }

    /// Resolve the flat settings for `node` at `tier`.
    pub fn resolve(&self, node: NodeId, tier: Tier) -> ResolvedSettings {
        ResolvedSettings::fold(&self.layers(node, tier))
    }

    /// Nearest value of `section.key` from `node` upward.
    pub fn lookup(&self, node: NodeId, section: &str, key: &str) -> Option<&'a str> {
        self.tree
            .ancestry(node)
            .into_iter()
            .find_map(|id| self.tree.get(id).section(section).and_then(|s| s.get(key)))
    }

    /// Nearest boolean `section.key`, false when unset or unparseable.
    pub fn flag(&self, node: NodeId, section: &str, key: &str) -> bool {
        self.lookup(node, section, key)
            .and_then(parse_bool)
            .unwrap_or(false)
    }

    /// Whether `node` fans out to every lower tier for items of `section`.
    pub fn multiple_resolution(&self, node: NodeId, section: &str) -> bool {
        self.flag(node, section, keys::MULTIPLE_RESOLUTION)
    }
}

/// Notification context for `node`, given the one in effect for its parent.
///
/// Each Pushover key is taken from the node when present, else inherited.
pub fn inherit_notify_context(parent: &NotifyContext, node: &ConfigNode) -> NotifyContext {
    let section = node.section(keys::PUSHOVER);
    let local = |key: &str| section.and_then(|s| s.get(key)).map(str::to_string);

    NotifyContext {
        pushover_user: local(keys::PUSHOVER_USER).or_else(|| parent.pushover_user.clone()),
        pushover_api: local(keys::PUSHOVER_API).or_else(|| parent.pushover_api.clone()),
    }
}
