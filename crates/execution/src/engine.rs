//! The scheduler - runs the scan loop.

use crate::{Flow, SchedulerConfig, StopReason, Walker};
use convy_config::{ConfigError, TreeBuilder};
use convy_core::ConfigTree;
use convy_notify::Notifier;
use convy_storage::MarkerStore;
use convy_tools::{Encoder, Prober};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the scheduler is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Rebuilding trees from disk
    Scanning,
    /// Walking trees for work
    Processing,
    /// One item was encoded (or failed) this cycle
    ItemSettled,
    /// The whole walk found nothing to do
    AllSkipped,
    /// Waiting before the next scan
    Sleeping,
}

/// The scheduler.
///
/// Runs the loop:
/// ```text
/// Scanning → Processing → {ItemSettled, AllSkipped} → Sleeping → Scanning
/// ```
/// At most one item is encoded per cycle. Trees are rebuilt every cycle, so
/// the only state carried between cycles is what the marker store holds.
pub struct Scheduler<M: MarkerStore> {
    roots: Vec<PathBuf>,
    builder: TreeBuilder,
    markers: M,
    prober: Box<dyn Prober>,
    encoder: Box<dyn Encoder>,
    notifier: Box<dyn Notifier>,
    config: SchedulerConfig,
    state: SchedulerState,
    cycles_run: usize,
}

impl<M: MarkerStore> Scheduler<M> {
    /// Create a scheduler with no roots.
    pub fn new(markers: M, prober: Box<dyn Prober>, encoder: Box<dyn Encoder>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            roots: Vec::new(),
            builder: TreeBuilder::new(),
            markers,
            prober,
            encoder,
            notifier,
            config: SchedulerConfig::default(),
            state: SchedulerState::Scanning,
            cycles_run: 0,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the tree builder.
    pub fn with_tree_builder(mut self, builder: TreeBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Add a managed root after checking that its tree builds.
    pub async fn add_root(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.builder.build(path).await?;
        let root = tokio::fs::canonicalize(path).await.map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if self.roots.contains(&root) {
            debug!("Root {} already managed", root.display());
            return Ok(());
        }
        info!("Managing {}", root.display());
        self.roots.push(root);
        Ok(())
    }

    /// Managed roots.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Build a fresh tree for every root. Any failure fails the whole scan.
    pub async fn scan(&self) -> Result<Vec<ConfigTree>, ConfigError> {
        let mut trees = Vec::with_capacity(self.roots.len());
        for root in &self.roots {
            trees.push(self.builder.build(root).await?);
        }
        Ok(trees)
    }

    /// Run one cycle: scan, then walk until the first unit of work settles.
    pub async fn run_cycle(&mut self) -> anyhow::Result<CycleResult> {
        self.state = SchedulerState::Scanning;
        info!("Starting scan cycle {}", self.cycles_run + 1);
        let trees = self.scan().await?;

        self.state = SchedulerState::Processing;
        let mut result = CycleResult::AllSkipped;
        for tree in &trees {
            debug!("Walking {}", tree.path().display());
            let walker = Walker::new(
                tree,
                &self.markers,
                self.prober.as_ref(),
                self.encoder.as_ref(),
                self.notifier.as_ref(),
            );
            if let Flow::StopAndSleep(reason) = walker.walk().await? {
                result = CycleResult::Settled(reason);
                break;
            }
        }

        self.state = match result {
            CycleResult::Settled(_) => SchedulerState::ItemSettled,
            CycleResult::AllSkipped => SchedulerState::AllSkipped,
        };
        self.cycles_run += 1;
        Ok(result)
    }

    /// Run cycles until `max_cycles` is reached, or forever.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let result = self.run_cycle().await?;

            match &result {
                CycleResult::Settled(reason) => {
                    info!(
                        "Settled {} ({})",
                        reason.source.display(),
                        if reason.settlement.is_success() { "completed" } else { "failed" }
                    );
                }
                CycleResult::AllSkipped => debug!("Nothing to do"),
            }

            if let Some(max) = self.config.max_cycles {
                if self.cycles_run >= max {
                    info!("Reached max cycles ({})", max);
                    break;
                }
            }

            self.state = SchedulerState::Sleeping;
            if matches!(result, CycleResult::Settled(_)) {
                tokio::time::sleep(self.config.settle_cooldown).await;
            }
            tokio::time::sleep(self.config.scan_interval).await;
        }

        Ok(())
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Get cycles run so far.
    pub fn cycles(&self) -> usize {
        self.cycles_run
    }

    /// Get a reference to the marker store.
    pub fn markers(&self) -> &M {
        &self.markers
    }
}

/// Result of a single cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleResult {
    /// One item was encoded or failed
    Settled(StopReason),
    /// Everything was already settled or deferred
    AllSkipped,
}
