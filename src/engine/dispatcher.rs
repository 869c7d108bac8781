// src/engine/dispatcher.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bridge::{BridgeStreams, WatchError, WatchEvent};
use crate::fs::FileSystem;
use crate::types::{InvalidateMode, RegistrationPolicy};

use super::walk::register_subtree;
use super::{lock, SharedState};

/// The one task that mutates the watch tree in response to raw events.
///
/// For every raw event it first brings the tree up to date (on the blocking
/// pool, since that may walk a directory tree) and only then forwards the
/// event, so a caller that has just received an event already
/// sees a tree that reflects it. Forwarding waits for room in the bounded
/// outbound channel; a slow caller therefore also slows down bookkeeping.
///
/// The loop ends only when both inbound streams have closed, which happens
/// after the primitive is shut down. Dropping the outbound senders on exit
/// closes the caller's streams.
pub struct Dispatcher {
    state: SharedState,
    fs: Arc<dyn FileSystem>,
    inbound: BridgeStreams,
    events_tx: mpsc::Sender<WatchEvent>,
    errors_tx: mpsc::Sender<WatchError>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("fs", &self.fs)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        state: SharedState,
        fs: Arc<dyn FileSystem>,
        inbound: BridgeStreams,
        events_tx: mpsc::Sender<WatchEvent>,
        errors_tx: mpsc::Sender<WatchError>,
    ) -> Self {
        Self {
            state,
            fs,
            inbound,
            events_tx,
            errors_tx,
        }
    }

    pub async fn run(self) {
        let Dispatcher {
            state,
            fs,
            mut inbound,
            events_tx,
            errors_tx,
        } = self;

        info!("dispatcher started");

        let mut events_open = true;
        let mut errors_open = true;

        while events_open || errors_open {
            tokio::select! {
                ev = inbound.events.recv(), if events_open => match ev {
                    Some(ev) => {
                        debug!(event = %ev, "raw event");
                        // Walks hit the disk; keep them off the runtime workers.
                        let (task_state, task_fs, raw) =
                            (Arc::clone(&state), Arc::clone(&fs), ev.clone());
                        let bookkeeping = tokio::task::spawn_blocking(move || {
                            apply_event(&task_state, task_fs.as_ref(), &raw)
                        });
                        if let Err(err) = bookkeeping.await {
                            warn!(%err, "bookkeeping for event failed");
                        }
                        if events_tx.send(ev).await.is_err() {
                            debug!("event receiver dropped; event discarded");
                        }
                    }
                    None => {
                        debug!("inbound event stream closed");
                        events_open = false;
                    }
                },
                err = inbound.errors.recv(), if errors_open => match err {
                    Some(err) => {
                        debug!(%err, "raw error");
                        if errors_tx.send(err).await.is_err() {
                            debug!("error receiver dropped; error discarded");
                        }
                    }
                    None => {
                        debug!("inbound error stream closed");
                        errors_open = false;
                    }
                },
            }
        }

        info!("dispatcher finished; closing outbound streams");
    }
}

/// Update the tree for one raw event.
///
/// - Known entry: something about that directory changed in a way we can't
///   read precisely, so drop its whole subtree (roots stay). A later create
///   event rebuilds whatever still exists. Changes inside the subtree in
///   between are not seen.
/// - Unknown path that is a directory on disk: register it and everything
///   below it.
/// - Anything else (files, vanished paths): nothing to do.
///
/// A create event for a known entry is itself the rebuild trigger: the
/// subtree is dropped and then registered again from disk. This happens
/// when a walk lists a directory whose own create event is still queued.
pub fn apply_event(state: &SharedState, fs: &dyn FileSystem, ev: &WatchEvent) {
    let invalidated = {
        let mut guard = lock(state);
        let shared = &mut *guard;
        if shared.tree.contains(&ev.path) {
            match shared.tree.invalidate_subtree(
                &ev.path,
                InvalidateMode::Implicit,
                shared.primitive.as_mut(),
            ) {
                Ok(removed) => debug!(path = ?ev.path, ?removed, "invalidated"),
                Err(err) => debug!(path = ?ev.path, %err, "invalidation failed"),
            }
            true
        } else {
            false
        }
    };

    if invalidated && !ev.is_create() {
        return;
    }

    if fs.is_dir(&ev.path) {
        match register_subtree(state, fs, &ev.path, RegistrationPolicy::BestEffort) {
            Ok(outcome) => debug!(
                path = ?ev.path,
                added = outcome.added.len(),
                skipped = outcome.skipped.len(),
                "registered new directory"
            ),
            Err(err) => debug!(path = ?ev.path, %err, "could not register new directory"),
        }
    }
}
