// tests/tree_properties.rs
//
// Walk and invalidation over arbitrary directory layouts. No runtime: the
// engine pieces are driven directly against a fake primitive.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use proptest::prelude::*;

use treewatch::engine::{lock, register_subtree, shared_state, SharedState};
use treewatch::fs::mock::MockFileSystem;
use treewatch::fs::FileSystem;
use treewatch::types::InvalidateMode;
use treewatch::RegistrationPolicy;
use treewatch_test_utils::{fake_primitive, FakeHandle};

const ROOT: &str = "/w";

/// Up to a dozen directories, each at most three levels below the root,
/// drawn from a small name pool so layouts share prefixes.
fn layout() -> impl Strategy<Value = Vec<PathBuf>> {
    prop::collection::vec(prop::collection::vec(0u8..3, 1..4), 0..12).prop_map(|dirs| {
        dirs.into_iter()
            .map(|parts| {
                parts
                    .iter()
                    .fold(PathBuf::from(ROOT), |acc, n| acc.join(format!("d{n}")))
            })
            .collect()
    })
}

fn disk(dirs: &[PathBuf]) -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_dir(ROOT);
    for dir in dirs {
        fs.add_dir(dir);
        fs.add_file(dir.join("f"));
    }
    fs
}

/// Every directory on disk under the root, root included.
fn all_dirs(fs: &MockFileSystem) -> BTreeSet<PathBuf> {
    let mut out = BTreeSet::new();
    let mut pending = vec![PathBuf::from(ROOT)];
    while let Some(dir) = pending.pop() {
        pending.extend(fs.subdirs(&dir).unwrap_or_default());
        out.insert(dir);
    }
    out
}

fn watched(fs: &MockFileSystem) -> (SharedState, FakeHandle) {
    let (primitive, handle, _inbound) = fake_primitive();
    let state = shared_state(Box::new(primitive));
    lock(&state).tree.add_root(Path::new(ROOT));
    register_subtree(&state, fs, Path::new(ROOT), RegistrationPolicy::Strict)
        .expect("walk over mock fs");
    (state, handle)
}

fn tree_paths(state: &SharedState) -> BTreeSet<PathBuf> {
    lock(state).tree.paths().cloned().collect()
}

proptest! {
    #[test]
    fn walk_mirrors_the_directories_on_disk(dirs in layout()) {
        let fs = disk(&dirs);
        let (state, handle) = watched(&fs);

        let expected = all_dirs(&fs);
        prop_assert_eq!(&tree_paths(&state), &expected);
        prop_assert_eq!(&handle.registered(), &expected);

        let guard = lock(&state);
        for dir in &expected {
            let children: BTreeSet<PathBuf> = guard
                .tree
                .children(dir)
                .expect("every tracked dir has an entry")
                .map(|name| dir.join(name))
                .collect();
            let on_disk: BTreeSet<PathBuf> = fs.subdirs(dir).unwrap_or_default().into_iter().collect();
            prop_assert_eq!(children, on_disk);
        }
    }

    #[test]
    fn implicit_invalidation_unlinks_target_and_keeps_root(
        dirs in layout(),
        pick in any::<prop::sample::Index>(),
    ) {
        let fs = disk(&dirs);
        let (state, handle) = watched(&fs);

        let known: Vec<PathBuf> = tree_paths(&state).into_iter().collect();
        let target = pick.get(&known).clone();

        {
            let mut guard = lock(&state);
            let shared = &mut *guard;
            shared
                .tree
                .invalidate_subtree(&target, InvalidateMode::Implicit, shared.primitive.as_mut())
                .expect("target is tracked");
        }

        let remaining = tree_paths(&state);
        prop_assert_eq!(&handle.registered(), &remaining);
        prop_assert!(remaining.contains(Path::new(ROOT)));
        for path in &remaining {
            prop_assert!(path == Path::new(ROOT) || !path.starts_with(&target));
        }

        if target != Path::new(ROOT) {
            prop_assert!(!remaining.contains(&target));
            let parent = target.parent().expect("below the root");
            let name = target.file_name().expect("has a name");
            let guard = lock(&state);
            let siblings: Vec<_> = guard.tree.children(parent).expect("parent kept").collect();
            prop_assert!(!siblings.iter().any(|s| s.as_os_str() == name));
        }
    }

    #[test]
    fn explicit_invalidation_of_root_clears_everything(dirs in layout()) {
        let fs = disk(&dirs);
        let (state, handle) = watched(&fs);

        {
            let mut guard = lock(&state);
            let shared = &mut *guard;
            shared.tree.drop_root(Path::new(ROOT));
            shared
                .tree
                .invalidate_subtree(Path::new(ROOT), InvalidateMode::Explicit, shared.primitive.as_mut())
                .expect("root is tracked");
        }

        prop_assert!(tree_paths(&state).is_empty());
        prop_assert!(handle.registered().is_empty());
        prop_assert_eq!(handle.unregistered().len(), all_dirs(&fs).len());
    }
}
