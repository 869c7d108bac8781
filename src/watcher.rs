// src/watcher.rs

//! Public entry points.
//!
//! ```no_run
//! # async fn demo() -> treewatch::errors::Result<()> {
//! use treewatch::{StreamItem, TreeWatcher, WatcherOptions};
//!
//! let (mut watcher, mut streams) = TreeWatcher::new(WatcherOptions::default())?;
//! watcher.watch("/tmp/project")?;
//!
//! while let Some(item) = streams.recv().await {
//!     match item {
//!         StreamItem::Event(ev) => println!("{ev}"),
//!         StreamItem::Error(err) => eprintln!("{err}"),
//!     }
//! }
//! watcher.join().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::bridge::{BridgeStreams, NotifyBridge, PrimitiveWatcher, WatchError, WatchEvent};
use crate::engine::{lock, register_subtree, shared_state, Dispatcher, SharedState};
use crate::errors::{Result, TreeWatchError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::tree::TreeSnapshot;
use crate::types::{InvalidateMode, RegistrationPolicy};

/// Knobs for a [`TreeWatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherOptions {
    pub policy: RegistrationPolicy,
    /// Bound of each outbound channel. `1` is the closest tokio gets to a
    /// rendezvous hand-off.
    pub event_capacity: usize,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            policy: RegistrationPolicy::default(),
            event_capacity: 1,
        }
    }
}

/// One item from either outbound stream.
#[derive(Debug)]
pub enum StreamItem {
    Event(WatchEvent),
    Error(WatchError),
}

/// Caller-facing event and error streams.
///
/// Both close after [`TreeWatcher::close`] once the dispatcher has drained
/// what the primitive still delivered.
#[derive(Debug)]
pub struct WatchStreams {
    pub events: mpsc::Receiver<WatchEvent>,
    pub errors: mpsc::Receiver<WatchError>,
    events_done: bool,
    errors_done: bool,
}

impl WatchStreams {
    /// Next item from whichever stream has one first. `None` once both
    /// streams are closed.
    pub async fn recv(&mut self) -> Option<StreamItem> {
        loop {
            if self.events_done && self.errors_done {
                return None;
            }
            tokio::select! {
                ev = self.events.recv(), if !self.events_done => match ev {
                    Some(ev) => return Some(StreamItem::Event(ev)),
                    None => self.events_done = true,
                },
                err = self.errors.recv(), if !self.errors_done => match err {
                    Some(err) => return Some(StreamItem::Error(err)),
                    None => self.errors_done = true,
                },
            }
        }
    }
}

/// Recursive directory watcher.
///
/// Watching a directory watches every directory below it, including ones
/// created (or moved in) later. Directories moved out or deleted stop being
/// watched. Paths given to [`watch`](Self::watch) are roots and are only
/// dropped by [`remove_watch`](Self::remove_watch).
///
/// When a watched directory changes (renamed, deleted, or otherwise
/// reported on), its subtree is unwatched and rebuilt from the next create
/// event. Changes inside it during that gap are not reported; treat it as
/// "anything may have happened".
///
/// Paths are used as given; pass canonical paths if symlinked prefixes
/// matter (events are reported under the same prefix).
///
/// After [`close`](Self::close), `watch`, `remove_watch` and `close` all
/// return [`TreeWatchError::Closed`].
pub struct TreeWatcher {
    state: SharedState,
    fs: Arc<dyn FileSystem>,
    policy: RegistrationPolicy,
    dispatcher: Option<JoinHandle<()>>,
}

impl fmt::Debug for TreeWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeWatcher")
            .field("policy", &self.policy)
            .field("fs", &self.fs)
            .finish_non_exhaustive()
    }
}

impl TreeWatcher {
    /// Create a watcher on the platform's native notification API.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(options: WatcherOptions) -> Result<(Self, WatchStreams)> {
        let (bridge, inbound) = NotifyBridge::new()?;
        Ok(Self::with_primitive(
            Box::new(bridge),
            inbound,
            Arc::new(RealFileSystem),
            options,
        ))
    }

    /// Create a watcher over an arbitrary primitive and filesystem.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_primitive(
        primitive: Box<dyn PrimitiveWatcher>,
        inbound: BridgeStreams,
        fs: Arc<dyn FileSystem>,
        options: WatcherOptions,
    ) -> (Self, WatchStreams) {
        let capacity = options.event_capacity.max(1);
        let (events_tx, events_rx) = mpsc::channel(capacity);
        let (errors_tx, errors_rx) = mpsc::channel(capacity);

        let state = shared_state(primitive);
        let dispatcher = Dispatcher::new(
            Arc::clone(&state),
            Arc::clone(&fs),
            inbound,
            events_tx,
            errors_tx,
        );
        let handle = tokio::spawn(dispatcher.run());

        let watcher = Self {
            state,
            fs,
            policy: options.policy,
            dispatcher: Some(handle),
        };
        let streams = WatchStreams {
            events: events_rx,
            errors: errors_rx,
            events_done: false,
            errors_done: false,
        };
        (watcher, streams)
    }

    /// Watch `path` and every directory below it.
    ///
    /// Fails with [`TreeWatchError::DuplicateWatch`] if `path` is already
    /// watched (as a root or as part of another root's tree). Registration
    /// failures follow the configured [`RegistrationPolicy`]; a failed call
    /// leaves no trace in the tree.
    pub fn watch(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let newly_root = {
            let mut guard = lock(&self.state);
            if guard.closed {
                return Err(TreeWatchError::Closed);
            }
            if guard.tree.contains(path) {
                return Err(TreeWatchError::DuplicateWatch(path.to_path_buf()));
            }
            guard.tree.add_root(path)
        };

        match register_subtree(&self.state, self.fs.as_ref(), path, self.policy) {
            Ok(outcome) => {
                info!(
                    ?path,
                    directories = outcome.added.len(),
                    skipped = outcome.skipped.len(),
                    "watching"
                );
                Ok(())
            }
            Err(err) => {
                self.roll_back(path, newly_root);
                Err(err)
            }
        }
    }

    fn roll_back(&self, path: &Path, newly_root: bool) {
        let mut guard = lock(&self.state);
        let shared = &mut *guard;
        if newly_root {
            shared.tree.drop_root(path);
        }
        if shared.tree.contains(path) {
            if let Ok(removed) = shared.tree.invalidate_subtree(
                path,
                InvalidateMode::Explicit,
                shared.primitive.as_mut(),
            ) {
                debug!(?path, ?removed, "rolled back partial watch");
            }
        }
    }

    /// Stop watching `path` and everything below it, root included.
    ///
    /// Fails with [`TreeWatchError::UnknownWatch`] if `path` is not
    /// watched. Unregister failures for individual directories are logged
    /// and otherwise ignored.
    pub fn remove_watch(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut guard = lock(&self.state);
        let shared = &mut *guard;

        if shared.closed {
            return Err(TreeWatchError::Closed);
        }
        if !shared.tree.contains(path) {
            return Err(TreeWatchError::UnknownWatch(path.to_path_buf()));
        }

        shared.tree.drop_root(path);
        let removed = shared.tree.invalidate_subtree(
            path,
            InvalidateMode::Explicit,
            shared.primitive.as_mut(),
        )?;
        info!(?path, directories = removed.len(), "stopped watching");
        Ok(())
    }

    /// Shut down the primitive. The dispatcher drains what is left and then
    /// closes both outbound streams. Not resumable.
    pub fn close(&self) -> Result<()> {
        let mut guard = lock(&self.state);
        if guard.closed {
            return Err(TreeWatchError::Closed);
        }
        guard.closed = true;
        guard.primitive.shutdown()?;
        info!("watcher closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    /// Wait for the dispatcher to finish. Only returns after
    /// [`close`](Self::close) and once the caller has taken (or dropped)
    /// every pending event.
    pub async fn join(&mut self) -> Result<()> {
        if let Some(handle) = self.dispatcher.take() {
            handle.await.map_err(anyhow::Error::from)?;
        }
        Ok(())
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        lock(&self.state).tree.snapshot()
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        let guard = lock(&self.state);
        let mut roots: Vec<PathBuf> = guard.tree.roots().cloned().collect();
        roots.sort();
        roots
    }

    pub fn is_watched(&self, path: impl AsRef<Path>) -> bool {
        lock(&self.state).tree.contains(path.as_ref())
    }
}

impl fmt::Display for TreeWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.snapshot())
    }
}

impl Drop for TreeWatcher {
    fn drop(&mut self) {
        // Without this the primitive (and so the dispatcher) would outlive us.
        let mut guard = lock(&self.state);
        if !guard.closed {
            guard.closed = true;
            if let Err(err) = guard.primitive.shutdown() {
                debug!(%err, "shutdown on drop failed");
            }
        }
    }
}
