// src/bridge/native.rs

use std::path::Path;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::errors::{Result, TreeWatchError};

use super::{BridgeStreams, PrimitiveWatcher, WatchEvent, WatchEventKind};

/// [`PrimitiveWatcher`] backed by the platform watcher from `notify`.
///
/// The notify callback runs on notify's own thread, so it only pushes into
/// unbounded channels; all interpretation happens in the dispatcher.
pub struct NotifyBridge {
    inner: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for NotifyBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyBridge")
            .field("open", &self.inner.is_some())
            .finish()
    }
}

impl NotifyBridge {
    pub fn new() -> Result<(Self, BridgeStreams)> {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<WatchEvent>();
        let (error_tx, error_rx) = mpsc::unbounded_channel::<notify::Error>();

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for ev in translate(event) {
                        if event_tx.send(ev).is_err() {
                            trace!("dispatcher gone; dropping raw event");
                        }
                    }
                }
                Err(err) => {
                    if error_tx.send(err).is_err() {
                        trace!("dispatcher gone; dropping raw error");
                    }
                }
            },
            Config::default(),
        )?;

        let streams = BridgeStreams {
            events: event_rx,
            errors: error_rx,
        };
        Ok((
            Self {
                inner: Some(watcher),
            },
            streams,
        ))
    }

    fn inner(&mut self) -> Result<&mut RecommendedWatcher> {
        self.inner.as_mut().ok_or(TreeWatchError::Closed)
    }
}

impl PrimitiveWatcher for NotifyBridge {
    fn register(&mut self, path: &Path) -> Result<()> {
        self.inner()?
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|source| TreeWatchError::Registration {
                path: path.to_path_buf(),
                source,
            })
    }

    fn unregister(&mut self, path: &Path) -> Result<()> {
        self.inner()?
            .unwatch(path)
            .map_err(|source| TreeWatchError::Unregistration {
                path: path.to_path_buf(),
                source,
            })
    }

    fn shutdown(&mut self) -> Result<()> {
        // Dropping the watcher stops its event thread, which drops the
        // callback and with it both senders.
        match self.inner.take() {
            Some(watcher) => {
                drop(watcher);
                debug!("notify watcher shut down");
                Ok(())
            }
            None => Err(TreeWatchError::Closed),
        }
    }
}

/// Narrow a `notify` event to one [`WatchEvent`] per affected path.
///
/// Kinds outside create/write/remove/rename/metadata are dropped. A rename
/// is reported as `Rename` on the old path and `Create` on the new one;
/// notify's combined `Both` event repeats that pair and is skipped.
pub fn translate(event: Event) -> Vec<WatchEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => WatchEventKind::Create,
        EventKind::Remove(_) => WatchEventKind::Remove,
        EventKind::Modify(ModifyKind::Metadata(_)) => WatchEventKind::Metadata,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => WatchEventKind::Create,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => return Vec::new(),
        EventKind::Modify(ModifyKind::Name(_)) => WatchEventKind::Rename,
        EventKind::Modify(_) => WatchEventKind::Write,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .map(|path| WatchEvent { path, kind })
        .collect()
}
