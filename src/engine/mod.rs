// src/engine/mod.rs

//! Bookkeeping engine behind [`crate::watcher::TreeWatcher`].
//!
//! - [`walk`] registers a directory and everything below it.
//! - [`dispatcher`] is the single task that turns raw primitive events into
//!   tree updates and then hands the events on to the caller.
//!
//! Both share one [`SharedState`]: the watch tree and the primitive behind
//! a single mutex. The lock is taken per tree operation and never held
//! across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::bridge::PrimitiveWatcher;
use crate::tree::WatchTree;

pub mod dispatcher;
pub mod walk;

pub use dispatcher::Dispatcher;
pub use walk::{register_subtree, WalkOutcome};

/// Everything the lock protects.
pub struct Shared {
    pub tree: WatchTree,
    pub primitive: Box<dyn PrimitiveWatcher>,
    /// Set once `close` has been called.
    pub closed: bool,
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("tree", &self.tree)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

pub type SharedState = Arc<Mutex<Shared>>;

pub fn shared_state(primitive: Box<dyn PrimitiveWatcher>) -> SharedState {
    Arc::new(Mutex::new(Shared {
        tree: WatchTree::new(),
        primitive,
        closed: false,
    }))
}

/// Lock the shared state.
///
/// A panic while holding the lock cannot leave the tree half-updated in a
/// way later operations would trip over, so poisoning is ignored.
pub fn lock(state: &SharedState) -> MutexGuard<'_, Shared> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
