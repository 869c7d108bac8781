use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use treewatch::bridge::{BridgeStreams, PrimitiveWatcher, WatchError, WatchEvent};
use treewatch::errors::{Result, TreeWatchError};

/// One call made against the fake primitive, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Register(PathBuf),
    Unregister(PathBuf),
    Shutdown,
}

#[derive(Debug, Default)]
struct FakeState {
    registered: BTreeSet<PathBuf>,
    calls: Vec<Call>,
    fail_register: HashSet<PathBuf>,
    events: Option<mpsc::UnboundedSender<WatchEvent>>,
    errors: Option<mpsc::UnboundedSender<WatchError>>,
}

/// A primitive watcher that:
/// - records every register / unregister / shutdown call
/// - fails `register` for paths the test marked as failing
/// - emits only the events the test pushes through its [`FakeHandle`]
/// - closes both streams on `shutdown`, like the real one
#[derive(Debug)]
pub struct FakePrimitive {
    state: Arc<Mutex<FakeState>>,
}

/// Test-side handle onto a [`FakePrimitive`] that has been moved into a
/// watcher.
#[derive(Debug, Clone)]
pub struct FakeHandle {
    state: Arc<Mutex<FakeState>>,
}

pub fn fake_primitive() -> (FakePrimitive, FakeHandle, BridgeStreams) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (error_tx, error_rx) = mpsc::unbounded_channel();
    let state = Arc::new(Mutex::new(FakeState {
        events: Some(event_tx),
        errors: Some(error_tx),
        ..Default::default()
    }));

    let streams = BridgeStreams {
        events: event_rx,
        errors: error_rx,
    };
    (
        FakePrimitive {
            state: Arc::clone(&state),
        },
        FakeHandle { state },
        streams,
    )
}

impl PrimitiveWatcher for FakePrimitive {
    fn register(&mut self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Register(path.to_path_buf()));
        if state.events.is_none() {
            return Err(TreeWatchError::Closed);
        }
        if state.fail_register.contains(path) {
            return Err(TreeWatchError::Registration {
                path: path.to_path_buf(),
                source: notify::Error::generic("injected register failure"),
            });
        }
        state.registered.insert(path.to_path_buf());
        Ok(())
    }

    fn unregister(&mut self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Unregister(path.to_path_buf()));
        if !state.registered.remove(path) {
            return Err(TreeWatchError::Unregistration {
                path: path.to_path_buf(),
                source: notify::Error::generic("path was never registered"),
            });
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Shutdown);
        if state.events.is_none() {
            return Err(TreeWatchError::Closed);
        }
        state.events = None;
        state.errors = None;
        Ok(())
    }
}

impl FakeHandle {
    /// Push a raw event as if the OS had reported it.
    pub fn emit(&self, event: WatchEvent) {
        let state = self.state.lock().unwrap();
        if let Some(tx) = state.events.as_ref() {
            tx.send(event).expect("dispatcher dropped its event receiver");
        }
    }

    /// Push a raw asynchronous error.
    pub fn emit_error(&self, err: WatchError) {
        let state = self.state.lock().unwrap();
        if let Some(tx) = state.errors.as_ref() {
            tx.send(err).expect("dispatcher dropped its error receiver");
        }
    }

    /// Make every future `register` of `path` fail.
    pub fn fail_register_on(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.fail_register.insert(path.as_ref().to_path_buf());
    }

    /// Paths currently armed.
    pub fn registered(&self) -> BTreeSet<PathBuf> {
        self.state.lock().unwrap().registered.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn unregistered(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Unregister(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.lock().unwrap().events.is_none()
    }
}
