use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use splaylist_cache::config::Config;
use splaylist_cache::logging::init_tracing;
use splaylist_cache::reconciler::Reconciler;
use splaylist_cache::reporting::TracingSink;
use splaylist_cache::service::SnapshotSource;
use splaylist_cache::storage::{CacheStorage, LocalStorage};
use splaylist_cache::watch::SyncLoop;

#[derive(Parser)]
#[command(name = "splaylist-cache", about = "Keep a local splaylist cache in sync")]
struct Cli {
    /// Config file (default: <config_dir>/splaylist-cache/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single sync pass
    Sync {
        /// Remote snapshot to sync from (overrides config)
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Sync on the configured interval
    Watch {
        /// Remote snapshot to sync from (overrides config)
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Stop after this many passes
        #[arg(long)]
        passes: Option<usize>,
    },
    /// Print the cached splaylists
    Show {
        /// Only playlists containing this track
        #[arg(long)]
        track: Option<String>,
    },
    /// Print the config path and an example config
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match cli.command {
        Command::Config => {
            println!("# {}", config_path.display());
            print!("{}", Config::example_config());
            Ok(ExitCode::SUCCESS)
        }
        Command::Sync { snapshot } => {
            let (config, storage) = load(&config_path)?;
            let sync_loop = build_loop(&config, snapshot, storage)?;
            match sync_loop.run_once().await? {
                Ok(report) => {
                    let mut deleted: Vec<&String> = report.deleted.iter().collect();
                    deleted.sort();
                    println!(
                        "refreshed {}, unchanged {}, deleted {}, failed {}",
                        report.refreshed.len(),
                        report.unchanged,
                        deleted.len(),
                        report.failures.len()
                    );
                    for id in deleted {
                        println!("deleted {}", id);
                    }
                    for failure in &report.failures {
                        println!("failed  {}", failure);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Watch { snapshot, passes } => {
            let (config, storage) = load(&config_path)?;
            let Some(interval) = config.sync.interval() else {
                eprintln!("Periodic sync is disabled (sync.interval_minutes <= 0)");
                return Ok(ExitCode::FAILURE);
            };
            let sync_loop = build_loop(&config, snapshot, storage)?;
            tracing::info!("syncing every {} minutes", interval.as_secs() / 60);
            sync_loop.run(interval, passes).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { track } => {
            let (_, storage) = load(&config_path)?;
            let Some(cache) = storage.load_cache().await? else {
                println!("No cache saved at {}", storage.path().display());
                return Ok(ExitCode::SUCCESS);
            };
            let playlists = match &track {
                Some(track_id) => cache.playlists_containing(track_id),
                None => {
                    let mut all: Vec<_> = cache.splaylists.values().collect();
                    all.sort_by(|a, b| a.id.cmp(&b.id));
                    all
                }
            };
            for playlist in playlists {
                println!(
                    "{}\t{}\t{} tracks\t(modified {})",
                    playlist.id,
                    playlist.title,
                    playlist.track_ids.len(),
                    playlist.last_modified
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load the config, install logging and open the cache store.
fn load(config_path: &Path) -> Result<(Config, LocalStorage)> {
    let config = Config::load_from(config_path)?;
    init_tracing(&config.logging.level)?;

    let store_path = match &config.store.path {
        Some(path) => path.clone(),
        None => LocalStorage::default_path()?,
    };
    let storage = LocalStorage::open(&store_path)?;
    Ok((config, storage))
}

fn build_loop(
    config: &Config,
    snapshot: Option<PathBuf>,
    storage: LocalStorage,
) -> Result<SyncLoop<SnapshotSource, TracingSink, LocalStorage>> {
    let snapshot_path = snapshot
        .or_else(|| config.source.snapshot_path.clone())
        .context("No remote snapshot configured (set source.snapshot_path or pass --snapshot)")?;

    Ok(SyncLoop::new(
        Reconciler::new(SnapshotSource::new(snapshot_path), TracingSink),
        storage,
        config.sync.user.clone(),
        config.sync.auto_playlists(),
    ))
}
