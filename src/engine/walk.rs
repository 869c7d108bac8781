// src/engine/walk.rs

//! Recursive registration walk.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{Result, TreeWatchError};
use crate::fs::FileSystem;
use crate::tree::WatchTree;
use crate::types::RegistrationPolicy;

use super::{lock, SharedState};

/// What a successful walk did.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Directories that became new tree entries, parents first.
    pub added: Vec<PathBuf>,
    /// Directories skipped under [`RegistrationPolicy::BestEffort`], with
    /// the reason.
    pub skipped: Vec<(PathBuf, TreeWatchError)>,
}

/// Register `root` and every directory below it, inserting each into the
/// tree right after its registration succeeds.
///
/// Parents are always handled before their children so each child links
/// into its parent's entry. Listing a directory happens outside the lock;
/// each register + insert pair happens under it.
///
/// Because the lock is dropped between steps, every directory is checked
/// again before it is registered:
/// - a directory that is already an entry (another root's tree) is left
///   alone and not descended into;
/// - a directory whose parent stopped being an entry in the meantime is
///   pruned along with everything below it. The walk root only needs this
///   when it is not itself a root.
///
/// Failing to register `root` itself is always an error. Failures further
/// down are an error under [`RegistrationPolicy::Strict`] and a skipped
/// subtree under [`RegistrationPolicy::BestEffort`]. On error, entries the
/// walk already added stay in place; undoing them is the caller's call.
pub fn register_subtree(
    state: &SharedState,
    fs: &dyn FileSystem,
    root: &Path,
    policy: RegistrationPolicy,
) -> Result<WalkOutcome> {
    let mut outcome = WalkOutcome::default();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let is_root = dir == root;

        {
            let mut guard = lock(state);
            let shared = &mut *guard;
            if let Some(reason) = prune_reason(&shared.tree, &dir, is_root) {
                debug!(?dir, reason, "not registering directory");
                continue;
            }
            if let Err(err) = shared.primitive.register(&dir) {
                if is_root || policy == RegistrationPolicy::Strict {
                    return Err(err);
                }
                warn!(?dir, %err, "failed to register directory; skipping its subtree");
                outcome.skipped.push((dir, err));
                continue;
            }
            if shared.tree.insert(&dir) {
                outcome.added.push(dir.clone());
            }
        }
        debug!(?dir, "registered directory");

        match fs.subdirs(&dir) {
            Ok(children) => pending.extend(children),
            Err(err) if is_root || policy == RegistrationPolicy::Strict => {
                return Err(TreeWatchError::Other(err));
            }
            Err(err) => {
                // Usually the directory vanished after we registered it; the
                // remove event that follows will clean the entry up.
                debug!(?dir, %err, "could not list directory; not descending");
            }
        }
    }

    Ok(outcome)
}

fn prune_reason(tree: &WatchTree, dir: &Path, is_walk_root: bool) -> Option<&'static str> {
    if is_walk_root && tree.is_root(dir) {
        return None;
    }
    if !is_walk_root && tree.contains(dir) {
        return Some("already watched");
    }
    match dir.parent() {
        Some(parent) if tree.contains(parent) => None,
        _ => Some("parent no longer watched"),
    }
}
