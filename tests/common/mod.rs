#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout, Instant};

use treewatch::fs::mock::MockFileSystem;
use treewatch::{
    RegistrationPolicy, StreamItem, TreeSnapshot, TreeWatcher, WatchEvent, WatchStreams,
    WatcherOptions,
};
use treewatch_test_utils::{fake_primitive, FakeHandle};

pub use treewatch_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Watcher over a fake primitive and the given mock filesystem.
pub fn fake_watcher(
    fs: &MockFileSystem,
    policy: RegistrationPolicy,
) -> (TreeWatcher, WatchStreams, FakeHandle) {
    let (primitive, handle, inbound) = fake_primitive();
    let options = WatcherOptions {
        policy,
        event_capacity: 1,
    };
    let (watcher, streams) =
        TreeWatcher::with_primitive(Box::new(primitive), inbound, Arc::new(fs.clone()), options);
    (watcher, streams, handle)
}

/// Expected tree contents as `(path, [child names])` pairs.
pub fn tree(pairs: &[(&str, &[&str])]) -> BTreeMap<PathBuf, Vec<String>> {
    pairs
        .iter()
        .map(|(path, children)| {
            let mut names: Vec<String> = children.iter().map(|c| c.to_string()).collect();
            names.sort();
            (PathBuf::from(path), names)
        })
        .collect()
}

pub fn entries(watcher: &TreeWatcher) -> BTreeMap<PathBuf, Vec<String>> {
    watcher.snapshot().entries().clone()
}

/// Next event, failing on errors, closed streams, or a 2s silence.
pub async fn expect_event(streams: &mut WatchStreams) -> WatchEvent {
    match timeout(Duration::from_secs(2), streams.recv()).await {
        Ok(Some(StreamItem::Event(ev))) => ev,
        Ok(Some(StreamItem::Error(err))) => panic!("unexpected error from watcher: {err}"),
        Ok(None) => panic!("streams closed while waiting for an event"),
        Err(_) => panic!("no event within 2s"),
    }
}

/// Both streams must close within 5s without delivering anything else.
pub async fn expect_closed(streams: &mut WatchStreams) {
    match timeout(Duration::from_secs(5), streams.recv()).await {
        Ok(None) => {}
        Ok(Some(item)) => panic!("unexpected item after close: {item:?}"),
        Err(_) => panic!("streams did not close within time limit"),
    }
}

/// Keep draining events until `done` holds for the current tree, returning
/// every event seen on the way. Draining matters: with a bounded outbound
/// channel the dispatcher stalls when nobody reads.
pub async fn drain_until(
    streams: &mut WatchStreams,
    watcher: &TreeWatcher,
    done: impl Fn(&TreeSnapshot) -> bool,
) -> Vec<WatchEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    loop {
        if done(&watcher.snapshot()) {
            return seen;
        }
        if Instant::now() >= deadline {
            panic!(
                "condition not reached within 5s; tree: {}; events: {:?}",
                watcher, seen
            );
        }
        match timeout(Duration::from_millis(50), streams.recv()).await {
            Ok(Some(StreamItem::Event(ev))) => seen.push(ev),
            Ok(Some(StreamItem::Error(err))) => panic!("unexpected error from watcher: {err}"),
            Ok(None) => panic!("streams closed early"),
            Err(_) => {}
        }
    }
}

/// Drain until an event matching `want` shows up.
pub async fn drain_until_event(
    streams: &mut WatchStreams,
    want: impl Fn(&WatchEvent) -> bool,
) -> Vec<WatchEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        match timeout(Duration::from_millis(50), streams.recv()).await {
            Ok(Some(StreamItem::Event(ev))) => {
                let hit = want(&ev);
                seen.push(ev);
                if hit {
                    return seen;
                }
            }
            Ok(Some(StreamItem::Error(err))) => panic!("unexpected error from watcher: {err}"),
            Ok(None) => panic!("streams closed early"),
            Err(_) => {}
        }
    }
    panic!("expected event not seen within 5s; events: {seen:?}");
}

pub fn p(path: &str) -> PathBuf {
    Path::new(path).to_path_buf()
}
