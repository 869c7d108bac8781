// src/bridge/mod.rs

//! Adapter around the single-directory watch primitive.
//!
//! Everything above this module thinks in terms of three operations:
//! arm one directory, disarm one directory, shut the whole thing down. The
//! primitive has no idea about directory trees; [`crate::tree`] and the
//! dispatcher own that.
//!
//! - [`PrimitiveWatcher`] is the seam the rest of the crate talks to.
//! - [`NotifyBridge`] is the production implementation over `notify`.
//! - [`WatchEvent`] is the narrowed event shape re-exported to callers.

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::errors::Result;

pub mod native;

pub use native::{translate, NotifyBridge};

/// Asynchronous error reported by the primitive. Forwarded verbatim.
pub type WatchError = notify::Error;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    Create,
    Write,
    Remove,
    Rename,
    Metadata,
}

impl fmt::Display for WatchEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WatchEventKind::Create => "CREATE",
            WatchEventKind::Write => "WRITE",
            WatchEventKind::Remove => "REMOVE",
            WatchEventKind::Rename => "RENAME",
            WatchEventKind::Metadata => "CHMOD",
        };
        f.write_str(s)
    }
}

/// A single raw event for a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: WatchEventKind,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, kind: WatchEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn is_create(&self) -> bool {
        self.kind == WatchEventKind::Create
    }

    pub fn is_write(&self) -> bool {
        self.kind == WatchEventKind::Write
    }

    pub fn is_remove(&self) -> bool {
        self.kind == WatchEventKind::Remove
    }

    pub fn is_rename(&self) -> bool {
        self.kind == WatchEventKind::Rename
    }

    pub fn is_metadata(&self) -> bool {
        self.kind == WatchEventKind::Metadata
    }
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.path.display())
    }
}

/// Inbound streams produced by a primitive watcher.
///
/// Both receivers close once the primitive has been shut down and has
/// flushed whatever it still had in flight.
#[derive(Debug)]
pub struct BridgeStreams {
    pub events: mpsc::UnboundedReceiver<WatchEvent>,
    pub errors: mpsc::UnboundedReceiver<WatchError>,
}

/// Non-recursive, one-directory-at-a-time watch primitive.
///
/// Production code uses [`NotifyBridge`]; tests plug in a fake that records
/// calls and lets them inject events.
pub trait PrimitiveWatcher: Send {
    /// Arm a watch on exactly `path` (not its subdirectories).
    fn register(&mut self, path: &Path) -> Result<()>;

    /// Disarm a watch previously armed with [`register`](Self::register).
    fn unregister(&mut self, path: &Path) -> Result<()>;

    /// Stop the primitive. Once the in-flight events are flushed, both
    /// [`BridgeStreams`] receivers close.
    fn shutdown(&mut self) -> Result<()>;
}
