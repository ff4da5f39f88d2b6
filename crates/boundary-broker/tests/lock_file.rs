//! Advisory file lock semantics.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use boundary_broker::lock::{lock, unlock};

/// A unique scratch path; the marker is `<path>.lock` next to it.
fn scratch_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("boundary-lock-{tag}-{}-{nanos}", std::process::id()))
}

#[test]
fn lock_is_exclusive_until_unlocked() {
    let path = scratch_path("excl");
    std::fs::write(&path, b"shared resource").unwrap();

    assert!(lock(&path));
    assert!(!lock(&path));
    unlock(&path);
    assert!(lock(&path));
    unlock(&path);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn lock_works_for_paths_that_do_not_exist() {
    // The locked resource need not exist; only the marker matters.
    let path = scratch_path("ghost");
    assert!(lock(&path));
    assert!(!lock(&path));
    unlock(&path);
    assert!(lock(&path));
    unlock(&path);
}

#[test]
fn unlock_never_releases_a_foreign_lock() {
    let path = scratch_path("foreign");
    let marker = PathBuf::from(format!("{}.lock", path.display()));

    // Another process's marker.
    std::fs::write(&marker, b"12345").unwrap();
    assert!(!lock(&path));

    // We never acquired it, so unlock must leave the marker alone.
    unlock(&path);
    assert!(marker.exists());
    assert!(!lock(&path));

    std::fs::remove_file(&marker).unwrap();
    assert!(lock(&path));
    unlock(&path);
}

#[test]
fn unlock_without_lock_is_a_noop() {
    let path = scratch_path("noop");
    unlock(&path);
    assert!(lock(&path));
    unlock(&path);
}
