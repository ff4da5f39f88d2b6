//! Advisory mutual exclusion over a named filesystem resource.
//!
//! `lock` creates a `<path>.lock` sibling marker with create-new semantics:
//! whichever process creates it first holds the lock, everyone else gets
//! `false`. Contention is a normal answer, never an error. A process-local
//! table records the markers this process created so `unlock` cannot
//! release a lock held elsewhere.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use dashmap::DashSet;
use tracing::warn;

fn held_markers() -> &'static DashSet<PathBuf> {
    static HELD: OnceLock<DashSet<PathBuf>> = OnceLock::new();
    HELD.get_or_init(DashSet::new)
}

fn marker_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Try to acquire the lock for `path`; `true` on success, `false` when it
/// is already held by this or any other process.
pub fn lock(path: impl AsRef<Path>) -> bool {
    let marker = marker_path(path.as_ref());
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&marker)
    {
        Ok(mut file) => {
            // pid is informational, for finding stale markers by hand
            let _ = write!(file, "{}", std::process::id());
            held_markers().insert(marker);
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => false,
        Err(e) => {
            warn!(marker = %marker.display(), error = %e, "lock marker creation failed");
            false
        }
    }
}

/// Release a lock this process acquired; a no-op otherwise.
pub fn unlock(path: impl AsRef<Path>) {
    let marker = marker_path(path.as_ref());
    if held_markers().remove(&marker).is_some() {
        if let Err(e) = std::fs::remove_file(&marker) {
            warn!(marker = %marker.display(), error = %e, "lock marker removal failed");
        }
    }
}
