// src/tree/mod.rs

//! In-memory mirror of which directories are currently watched.
//!
//! [`WatchTree`] is plain data: no locks, no channels, no filesystem
//! access. The only side effect it performs is calling
//! [`PrimitiveWatcher::unregister`] for entries it drops, so that the
//! invariant "every entry is registered with the primitive" holds on both
//! sides of every operation. Serialising access is the owner's job.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::bridge::PrimitiveWatcher;
use crate::errors::{Result, TreeWatchError};
use crate::types::InvalidateMode;

#[derive(Debug, Default)]
pub struct WatchTree {
    /// Watched directory -> basenames of its watched subdirectories.
    entries: HashMap<PathBuf, BTreeSet<OsString>>,
    /// Paths passed explicitly to `watch`.
    roots: HashSet<PathBuf>,
}

impl WatchTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn children(&self, path: &Path) -> Option<impl Iterator<Item = &OsString>> {
        self.entries.get(path).map(|c| c.iter())
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.keys()
    }

    /// Record `path` as watched.
    ///
    /// Returns `false` if it was already an entry; its child set is left
    /// untouched in that case. Either way the basename is linked into the
    /// parent's child set when the parent is itself an entry.
    pub fn insert(&mut self, path: &Path) -> bool {
        let added = if self.entries.contains_key(path) {
            false
        } else {
            self.entries.insert(path.to_path_buf(), BTreeSet::new());
            true
        };

        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            if let Some(siblings) = self.entries.get_mut(parent) {
                siblings.insert(name.to_os_string());
            }
        }

        trace!(?path, added, "tree insert");
        added
    }

    pub fn is_root(&self, path: &Path) -> bool {
        self.roots.contains(path)
    }

    pub fn add_root(&mut self, path: &Path) -> bool {
        self.roots.insert(path.to_path_buf())
    }

    pub fn drop_root(&mut self, path: &Path) -> bool {
        self.roots.remove(path)
    }

    pub fn roots(&self) -> impl Iterator<Item = &PathBuf> {
        self.roots.iter()
    }

    /// Drop `path` and every entry below it, unregistering each one.
    ///
    /// Roots are kept (still registered, still in the tree) wherever they
    /// appear, except that in [`InvalidateMode::Explicit`] the target
    /// itself is always removed. Descendants of a kept root are still
    /// removed.
    ///
    /// Unregister failures are logged and skipped so one bad descendant
    /// cannot keep the rest registered. Returns the removed paths in
    /// removal order (children before parents).
    pub fn invalidate_subtree(
        &mut self,
        path: &Path,
        mode: InvalidateMode,
        primitive: &mut dyn PrimitiveWatcher,
    ) -> Result<Vec<PathBuf>> {
        if !self.entries.contains_key(path) {
            return Err(TreeWatchError::UnknownWatch(path.to_path_buf()));
        }

        let mut removed = Vec::new();
        // (dir, children_already_pushed)
        let mut stack: Vec<(PathBuf, bool)> = vec![(path.to_path_buf(), false)];

        while let Some((dir, expanded)) = stack.pop() {
            if !expanded {
                let Some(children) = self.entries.get(&dir) else {
                    continue;
                };
                let child_paths: Vec<PathBuf> = children.iter().map(|c| dir.join(c)).collect();
                stack.push((dir, true));
                stack.extend(child_paths.into_iter().map(|c| (c, false)));
                continue;
            }

            let explicit_target = mode == InvalidateMode::Explicit && dir == path;
            if self.is_root(&dir) && !explicit_target {
                debug!(?dir, "keeping root during invalidation");
                continue;
            }

            self.remove_entry(&dir);
            if let Err(err) = primitive.unregister(&dir) {
                debug!(?dir, %err, "unregister failed; continuing");
            }
            removed.push(dir);
        }

        debug!(?path, ?mode, removed = removed.len(), "invalidated subtree");
        Ok(removed)
    }

    /// Remove a single entry and unlink it from its parent.
    fn remove_entry(&mut self, path: &Path) {
        self.entries.remove(path);
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            if let Some(siblings) = self.entries.get_mut(parent) {
                siblings.remove(name);
            }
        }
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        let entries = self
            .entries
            .iter()
            .map(|(path, children)| {
                let names = children
                    .iter()
                    .map(|c| c.to_string_lossy().into_owned())
                    .collect();
                (path.clone(), names)
            })
            .collect();
        let roots = self.roots.iter().cloned().collect();
        TreeSnapshot { entries, roots }
    }
}

/// Immutable copy of a [`WatchTree`], for diagnostics and tests.
///
/// The `Display` form is meant for humans; nothing parses it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSnapshot {
    entries: BTreeMap<PathBuf, Vec<String>>,
    roots: BTreeSet<PathBuf>,
}

impl TreeSnapshot {
    pub fn entries(&self) -> &BTreeMap<PathBuf, Vec<String>> {
        &self.entries
    }

    pub fn roots(&self) -> &BTreeSet<PathBuf> {
        &self.roots
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entries.contains_key(path.as_ref())
    }

    pub fn children_of(&self, path: impl AsRef<Path>) -> Option<&[String]> {
        self.entries.get(path.as_ref()).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for TreeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreeWatch:")?;
        for (path, children) in &self.entries {
            let marker = if self.roots.contains(path) { "*" } else { "" };
            write!(f, " {}{} [{}]", path.display(), marker, children.join(", "))?;
        }
        Ok(())
    }
}
