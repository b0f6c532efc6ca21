//! convy CLI - keeps a media library's encoded renditions up to date.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use convy_config::TreeBuilder;
use convy_execution::{clear_settlement, collect_status, Scheduler, SchedulerConfig};
use convy_notify::{LogNotifier, Notifier, PushoverNotifier};
use convy_storage::JsonMarkerStore;
use convy_tools::{FfmpegEncoder, FfprobeProber};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "convy")]
#[command(about = "Descriptor-driven media transcoding daemon", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch managed roots and encode one item per cycle
    Daemon {
        /// Managed root directories
        #[arg(default_value = ".")]
        dirs: Vec<PathBuf>,
        /// Seconds between scans
        #[arg(long, default_value = "1")]
        interval: u64,
        /// Seconds to wait after an item settles
        #[arg(long, default_value = "5")]
        cooldown: u64,
        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<usize>,
    },
    /// Show which items are settled and which are pending
    Status {
        /// Managed root directories
        #[arg(default_value = ".")]
        dirs: Vec<PathBuf>,
    },
    /// Remove markers so the next cycle tries again
    Redo {
        /// Output files (their owning item is reopened too), items or season folders
        #[arg(required = true)]
        targets: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Daemon { dirs, interval, cooldown, cycles } => {
            let mut config = SchedulerConfig::new()
                .with_scan_interval(Duration::from_secs(interval))
                .with_settle_cooldown(Duration::from_secs(cooldown));
            if let Some(max) = cycles {
                config = config.with_max_cycles(max);
            }

            let notifier: Box<dyn Notifier> = match PushoverNotifier::new() {
                Ok(n) => Box::new(n),
                Err(e) => {
                    warn!("Pushover unavailable, logging notifications instead: {}", e);
                    Box::new(LogNotifier)
                }
            };

            let mut scheduler = Scheduler::new(
                JsonMarkerStore::new(),
                Box::new(FfprobeProber::new()),
                Box::new(FfmpegEncoder::new()),
                notifier,
            )
            .with_config(config);

            for dir in &dirs {
                if let Err(e) = scheduler.add_root(dir).await {
                    error!("Not managing {}: {}", dir.display(), e);
                }
            }
            if scheduler.roots().is_empty() {
                bail!("no managed roots");
            }

            scheduler.run().await?;
            info!("Completed {} cycles", scheduler.cycles());
        }
        Commands::Status { dirs } => {
            let builder = TreeBuilder::new();
            let mut trees = Vec::new();
            for dir in &dirs {
                match builder.build(dir).await {
                    Ok(tree) => trees.push(tree),
                    Err(e) => error!("Not managing {}: {}", dir.display(), e),
                }
            }
            if trees.is_empty() {
                bail!("no managed roots");
            }

            let report = collect_status(&trees, &JsonMarkerStore::new()).await?;
            println!("{}", report);
        }
        Commands::Redo { targets } => {
            let store = JsonMarkerStore::new();
            for target in &targets {
                let cleared = clear_settlement(&store, target).await?;
                if cleared.is_empty() {
                    println!("No marker for {}", target.display());
                }
                for path in cleared {
                    println!("Cleared {}", path.display());
                }
            }
        }
    }

    Ok(())
}
