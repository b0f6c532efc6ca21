//! Depth-first walk of one configuration tree.
//!
//! The walk stops at the first unit of real work. Each step reports a
//! [`Flow`]: `Continue` when nothing was done here, `StopAndSleep` once an
//! encode has settled. Nothing after a stop is visited in the same cycle.

use convy_config::{inherit_notify_context, SettingsResolver};
use convy_core::{
    classify_tier, expand_ladder, is_video_file, keys, ConfigTree, Item, MarkerKind, MarkerRecord, Mode, NodeId,
    Notification, NotifyContext, Tier,
};
use convy_notify::Notifier;
use convy_storage::MarkerStore;
use convy_tools::{Encoder, Prober};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use crate::command::{tier_list, BuildOutcome, CommandBuilder, Settlement};

/// Outcome of a traversal step.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Nothing done here; keep walking
    Continue,
    /// A unit of work settled; end the cycle
    StopAndSleep(StopReason),
}

/// What ended a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct StopReason {
    /// Source that was encoded
    pub source: PathBuf,
    /// How it settled
    pub settlement: Settlement,
}

/// Result of looking at one source file.
enum Unit {
    /// All rungs already settled
    Done,
    /// Could not be classified this cycle
    Deferred,
    /// Encoded (or failed) just now
    Settled(StopReason),
}

/// Walks one tree with borrowed collaborators.
pub struct Walker<'a> {
    tree: &'a ConfigTree,
    resolver: SettingsResolver<'a>,
    markers: &'a dyn MarkerStore,
    prober: &'a dyn Prober,
    encoder: &'a dyn Encoder,
    notifier: &'a dyn Notifier,
}

impl<'a> Walker<'a> {
    /// Create a walker over `tree`.
    pub fn new(
        tree: &'a ConfigTree,
        markers: &'a dyn MarkerStore,
        prober: &'a dyn Prober,
        encoder: &'a dyn Encoder,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            tree,
            resolver: SettingsResolver::new(tree),
            markers,
            prober,
            encoder,
            notifier,
        }
    }

    /// Walk the whole tree, children in listing order.
    pub async fn walk(&self) -> anyhow::Result<Flow> {
        let order = self.tree.depth_first();
        // Pre-order guarantees a parent's context exists before its children.
        let mut contexts: Vec<NotifyContext> = vec![NotifyContext::default(); self.tree.len()];

        for id in order {
            let node = self.tree.get(id);
            let parent_ctx = node
                .parent()
                .map(|p| contexts[p.index()].clone())
                .unwrap_or_default();
            contexts[id.index()] = inherit_notify_context(&parent_ctx, node);
            let ctx = &contexts[id.index()];

            let flow = match node.mode {
                Mode::Container => Flow::Continue,
                Mode::Movie => self.walk_movie(id, ctx).await?,
                Mode::Series => self.walk_series(id, ctx).await?,
                Mode::Soundtrack => {
                    debug!("Soundtrack directory {} has no video work", node.path.display());
                    Flow::Continue
                }
            };

            if let Flow::StopAndSleep(reason) = flow {
                return Ok(Flow::StopAndSleep(reason));
            }
        }

        Ok(Flow::Continue)
    }

    /// Movie items are single files or folders of files.
    async fn walk_movie(&self, id: NodeId, ctx: &NotifyContext) -> anyhow::Result<Flow> {
        let outputs = output_dir_names(&self.resolver, id);
        for item in &self.tree.get(id).items {
            if !item.is_dir() && !is_video_file(&item.path) {
                continue;
            }
            if is_output_dir(item, &outputs) {
                continue;
            }
            if self.markers.exists(&item.path).await? {
                continue;
            }

            let units = item_units(item).await?;
            if units.is_empty() {
                continue;
            }

            let mut all_done = true;
            for source in &units {
                match self.process(id, source, keys::FEATURE, ctx).await? {
                    Unit::Done => {}
                    Unit::Deferred => all_done = false,
                    Unit::Settled(reason) => return Ok(Flow::StopAndSleep(reason)),
                }
            }

            if all_done {
                debug!("Movie {} complete", item.path.display());
                self.markers
                    .write(&item.path, &MarkerRecord::settled(MarkerKind::ItemComplete, &item.path))
                    .await?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Series items are season folders; loose video files count as episodes.
    async fn walk_series(&self, id: NodeId, ctx: &NotifyContext) -> anyhow::Result<Flow> {
        let outputs = output_dir_names(&self.resolver, id);
        for item in &self.tree.get(id).items {
            if is_output_dir(item, &outputs) {
                continue;
            }
            if !item.is_dir() {
                if !is_video_file(&item.path) || self.markers.exists(&item.path).await? {
                    continue;
                }
                if let Unit::Settled(reason) = self.process(id, &item.path, keys::EPISODE, ctx).await? {
                    return Ok(Flow::StopAndSleep(reason));
                }
                continue;
            }

            // A season marker skips the season without listing it.
            if self.markers.exists(&item.path).await? {
                continue;
            }

            let section = if is_specials_season(&item.name) { keys::SPECIAL } else { keys::EPISODE };
            let episodes = list_videos(&item.path).await?;
            if episodes.is_empty() {
                continue;
            }

            let mut all_done = true;
            for episode in &episodes {
                if self.markers.exists(episode).await? {
                    continue;
                }
                match self.process(id, episode, section, ctx).await? {
                    Unit::Done => {}
                    Unit::Deferred => all_done = false,
                    Unit::Settled(reason) => return Ok(Flow::StopAndSleep(reason)),
                }
            }

            if all_done {
                info!("Season {} complete", item.path.display());
                self.markers
                    .write(&item.path, &MarkerRecord::settled(MarkerKind::SeasonComplete, &item.path))
                    .await?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Classify, expand, build and, if anything is pending, encode one source.
    async fn process(&self, id: NodeId, source: &Path, section: &str, ctx: &NotifyContext) -> anyhow::Result<Unit> {
        let dims = match self.prober.probe(source).await {
            Ok(dims) => dims,
            Err(e) => {
                warn!("Skipping {}: {}", source.display(), e);
                return Ok(Unit::Deferred);
            }
        };
        let tier = match classify_tier(dims.width, dims.height) {
            Ok(tier) => tier,
            Err(e) => {
                warn!("Skipping {}: {}", source.display(), e);
                return Ok(Unit::Deferred);
            }
        };

        let multi = self.resolver.multiple_resolution(id, section);
        let ladder = expand_ladder(tier, multi);
        let builder = CommandBuilder::new(self.markers);
        let request = match builder.build(source, &ladder, |t| self.resolver.resolve(id, t)).await? {
            BuildOutcome::Skip => return Ok(Unit::Done),
            BuildOutcome::Request(request) => request,
        };

        let settlement = builder.execute(&request, self.encoder).await?;
        self.announce(source, &settlement, ctx).await;

        Ok(Unit::Settled(StopReason {
            source: source.to_path_buf(),
            settlement,
        }))
    }

    /// Best-effort notification; failures are logged and dropped.
    async fn announce(&self, source: &Path, settlement: &Settlement, ctx: &NotifyContext) {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.display().to_string());

        let notification = match settlement {
            Settlement::Completed { tiers, duration } => Notification::new(
                "convy: encoded",
                format!("{} [{}] in {}s", name, tier_list(tiers), duration.as_secs()),
            ),
            Settlement::Failed { tiers, pass, detail } => Notification::new(
                "convy: encode failed",
                format!("{} [{}] failed on pass {}: {}", name, tier_list(tiers), pass, detail),
            ),
        };

        if let Err(e) = self.notifier.notify(ctx, &notification).await {
            warn!("Notification for {} not delivered: {}", source.display(), e);
        }
    }
}

/// Leading component of every output directory configured at `id`.
///
/// Outputs land under the source's own directory, so a visible output
/// directory shows up among the node's items.
pub(crate) fn output_dir_names(resolver: &SettingsResolver<'_>, id: NodeId) -> Vec<String> {
    let mut names = Vec::new();
    for tier in Tier::DESCENDING {
        let settings = resolver.resolve(id, tier);
        let leading = Path::new(settings.output_directory())
            .components()
            .find(|c| *c != Component::CurDir);
        if let Some(Component::Normal(name)) = leading {
            let name = name.to_string_lossy().into_owned();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Whether `item` is one of the node's output directories.
pub(crate) fn is_output_dir(item: &Item, outputs: &[String]) -> bool {
    item.is_dir() && outputs.iter().any(|name| *name == item.name)
}

/// Source files of a movie item: the file itself, or a folder's videos.
pub(crate) async fn item_units(item: &Item) -> std::io::Result<Vec<PathBuf>> {
    if item.is_dir() {
        list_videos(&item.path).await
    } else {
        Ok(vec![item.path.clone()])
    }
}

/// Video files directly inside `dir`, sorted, dot-entries excluded.
pub(crate) async fn list_videos(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut videos = Vec::new();
    let mut rd = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !is_video_file(&path) {
            continue;
        }
        if tokio::fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false) {
            videos.push(path);
        }
    }
    videos.sort();
    Ok(videos)
}

/// `Specials`, `Season 0` and `Season 00` hold specials.
pub(crate) fn is_specials_season(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    if lower == "specials" {
        return true;
    }
    lower
        .strip_prefix("season")
        .map(|n| n.trim())
        .map(|n| !n.is_empty() && n.chars().all(|c| c == '0'))
        .unwrap_or(false)
}
