// src/lib.rs

//! Recursive directory watching on top of a non-recursive primitive.
//!
//! Watching a directory with [`TreeWatcher::watch`] watches it and every
//! directory below it; directories created, moved in, moved out or deleted
//! later are picked up or dropped as their events arrive.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod tree;
pub mod types;
pub mod watcher;

pub use bridge::{WatchError, WatchEvent, WatchEventKind};
pub use tree::TreeSnapshot;
pub use types::RegistrationPolicy;
pub use watcher::{StreamItem, TreeWatcher, WatchStreams, WatcherOptions};

use std::path::Path;

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::ConfigFile;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file, then CLI overrides)
/// - the watcher and its initial roots
/// - printing events until Ctrl-C, then a clean shutdown
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let (mut watcher, mut streams) = TreeWatcher::new(cfg.watcher_options())?;
    for root in &cfg.watch.roots {
        watcher.watch(root)?;
    }
    info!(roots = ?watcher.roots(), "treewatch running; Ctrl-C to stop");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut closing = false;

    loop {
        tokio::select! {
            item = streams.recv() => match item {
                Some(StreamItem::Event(ev)) => {
                    println!("{ev}");
                    if args.dump {
                        println!("{watcher}");
                    }
                }
                Some(StreamItem::Error(err)) => warn!(%err, "watch error"),
                None => break,
            },
            res = &mut ctrl_c, if !closing => {
                if let Err(e) = res {
                    warn!("failed to listen for Ctrl+C: {e}");
                }
                closing = true;
                watcher.close()?;
            }
        }
    }

    watcher.join().await?;
    info!("treewatch stopped");
    Ok(())
}

/// Config file (if any), then CLI paths and policy on top.
fn resolve_config(args: &CliArgs) -> Result<ConfigFile> {
    let mut cfg = if config_exists(&args.config) {
        load_and_validate(&args.config)?
    } else if !args.paths.is_empty() {
        debug!(config = ?args.config, "no config file; using defaults");
        ConfigFile::default()
    } else {
        bail!(
            "no paths given and config file {:?} not found",
            args.config
        );
    };

    if !args.paths.is_empty() {
        cfg = cfg.with_roots(args.paths.clone())?;
    }
    if let Some(policy) = args.policy {
        cfg.config.registration_policy = policy.into();
    }
    if cfg.watch.roots.is_empty() {
        bail!("nothing to watch: no paths given and [watch].roots is empty");
    }
    Ok(cfg)
}

fn config_exists(path: &Path) -> bool {
    path.is_file()
}

fn print_dry_run(cfg: &ConfigFile) {
    println!("treewatch dry-run");
    println!(
        "  config.registration_policy = {}",
        cfg.config.registration_policy
    );
    println!("  config.event_capacity = {}", cfg.config.event_capacity);
    println!();

    println!("roots ({}):", cfg.watch.roots.len());
    for root in &cfg.watch.roots {
        println!("  - {}", root.display());
    }

    debug!("dry-run complete (nothing watched)");
}
