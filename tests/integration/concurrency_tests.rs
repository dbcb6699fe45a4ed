use super::fixtures::{scanner, write_foo_bar};
use jomics::index::CollectionIndex;
use jomics::manager::IndexManager;
use jomics::signal::ShutdownHandler;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

/// Every id listed anywhere resolves in the same snapshot.
fn assert_consistent(index: &CollectionIndex) {
    let mut folders = vec![None];
    folders.extend(index.directory_ids().into_iter().map(Some));
    for folder in folders {
        for item in index.listing(folder).items {
            assert!(index.entry(item.id).is_some(), "dangling id {:08x}", item.id);
        }
    }
}

#[test]
fn test_readers_never_see_torn_index() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    write_foo_bar(&root.path().join("a.cbz"));

    let manager = Arc::new(IndexManager::start(scanner(cache.path()), root.path()).unwrap());
    let done = AtomicBool::new(false);

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    let index = manager.current();
                    assert_consistent(&index);
                    let len = index.len();
                    std::thread::yield_now();
                    assert_eq!(index.len(), len);
                }
            });
        }

        for i in 0..5 {
            write_foo_bar(&root.path().join(format!("series_{i}/issue.cbz")));
            manager.rescan().unwrap();
        }
        done.store(true, Ordering::SeqCst);
    });

    let index = manager.current();
    assert_eq!(index.len(), 1 + 5 * 2);
    assert_eq!(manager.generation(), 6);
}

#[test]
fn test_held_snapshot_survives_rescan() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    write_foo_bar(&root.path().join("old.cbz"));

    let manager = IndexManager::start(scanner(cache.path()), root.path()).unwrap();
    let held = manager.current();

    std::fs::remove_file(root.path().join("old.cbz")).unwrap();
    write_foo_bar(&root.path().join("new.cbz"));
    manager.rescan().unwrap();

    assert_eq!(held.listing(None).items[0].title, "Old");
    assert_eq!(manager.current().listing(None).items[0].title, "New");
}

#[test]
fn test_periodic_rescan_picks_up_changes() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let manager = Arc::new(IndexManager::start(scanner(cache.path()), root.path()).unwrap());
    assert!(manager.current().is_empty());

    let shutdown = ShutdownHandler::new();
    let handle = manager.spawn_periodic(Duration::from_millis(25), shutdown.clone());
    write_foo_bar(&root.path().join("late.cbz"));

    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    while manager.current().is_empty() && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(handle.is_running());

    shutdown.request_shutdown();
    handle.join();
    assert_eq!(manager.current().len(), 1);
}

#[test]
fn test_failed_rescan_keeps_serving() {
    let parent = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let root = parent.path().join("comics");
    write_foo_bar(&root.join("kept.cbz"));

    let manager = IndexManager::start(scanner(cache.path()), &root).unwrap();
    std::fs::rename(&root, parent.path().join("moved")).unwrap();

    assert!(manager.rescan().is_err());
    let index = manager.current();
    assert_eq!(index.len(), 1);
    assert_eq!(index.root(), Path::new(&root));
}
