// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File,
    Dir(Vec<String>), // List of child names
}

/// In-memory directory tree for driving the watcher without touching disk.
///
/// Clones share state, so a test can keep one handle and give another to
/// the watcher.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory (and any missing ancestors).
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock().unwrap();
        Self::ensure_dir(&mut entries, path.as_ref());
    }

    /// Create an empty file (and any missing ancestor directories).
    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock().unwrap();
        entries.insert(path.to_path_buf(), MockEntry::File);
        if let Some(parent) = path.parent() {
            Self::ensure_dir(&mut entries, parent);
            Self::link(&mut entries, parent, path);
        }
    }

    /// Remove `path` and everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|p, _| !p.starts_with(path));
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
                let name = name.to_string_lossy();
                children.retain(|c| *c != name);
            }
        }
    }

    /// Move `from` (and its subtree) to `to`.
    pub fn rename(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) {
        let (from, to) = (from.as_ref(), to.as_ref());
        let moved: Vec<(PathBuf, MockEntry)> = {
            let entries = self.entries.lock().unwrap();
            entries
                .iter()
                .filter(|(p, _)| p.starts_with(from))
                .map(|(p, e)| {
                    let target = match p.strip_prefix(from) {
                        Ok(rel) if !rel.as_os_str().is_empty() => to.join(rel),
                        _ => to.to_path_buf(),
                    };
                    (target, e.clone())
                })
                .collect()
        };
        self.remove(from);

        let mut entries = self.entries.lock().unwrap();
        if let Some(parent) = to.parent() {
            Self::ensure_dir(&mut entries, parent);
            Self::link(&mut entries, parent, to);
        }
        for (path, entry) in moved {
            entries.insert(path, entry);
        }
    }

    fn ensure_dir(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if entries.contains_key(path) {
            return;
        }
        entries.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        if let Some(parent) = path.parent() {
            if parent != path && !parent.as_os_str().is_empty() {
                Self::ensure_dir(entries, parent);
                Self::link(entries, parent, path);
            }
        }
    }

    fn link(entries: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
        if let (Some(MockEntry::Dir(children)), Some(name)) =
            (entries.get_mut(parent), child.file_name().and_then(|n| n.to_str()))
        {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }
}

impl FileSystem for MockFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        let entries = self.entries.lock().unwrap();
        matches!(entries.get(path), Some(MockEntry::Dir(_)))
    }

    fn subdirs(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::Dir(children)) => Ok(children
                .iter()
                .map(|name| path.join(name))
                .filter(|p| matches!(entries.get(p), Some(MockEntry::Dir(_))))
                .collect()),
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_file_creates_parents() {
        let fs = MockFileSystem::new();
        fs.add_file("/w/a/f");

        assert!(fs.is_dir(Path::new("/w")));
        assert!(fs.is_dir(Path::new("/w/a")));
        assert!(!fs.is_dir(Path::new("/w/a/f")));
        assert_eq!(fs.subdirs(Path::new("/w")).unwrap(), vec![PathBuf::from("/w/a")]);
        assert!(fs.subdirs(Path::new("/w/a")).unwrap().is_empty());
    }

    #[test]
    fn rename_moves_the_subtree() {
        let fs = MockFileSystem::new();
        fs.add_dir("/w/a/b");
        fs.rename("/w/a", "/w/c");

        assert!(!fs.is_dir(Path::new("/w/a")));
        assert!(!fs.is_dir(Path::new("/w/a/b")));
        assert!(fs.is_dir(Path::new("/w/c/b")));
        assert_eq!(fs.subdirs(Path::new("/w")).unwrap(), vec![PathBuf::from("/w/c")]);
    }

    #[test]
    fn remove_drops_descendants() {
        let fs = MockFileSystem::new();
        fs.add_dir("/w/a/b");
        fs.remove("/w/a");

        assert!(!fs.is_dir(Path::new("/w/a/b")));
        assert!(fs.subdirs(Path::new("/w")).unwrap().is_empty());
    }
}
