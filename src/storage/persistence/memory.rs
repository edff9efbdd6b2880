//! In-memory snapshot store.
//!
//! Holds the last saved snapshot for the lifetime of the process. Clones
//! share state, so a test can hand one clone to a service and inspect the
//! other.

use crate::storage::Snapshot;
use crate::storage::traits::SnapshotStore;
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    snapshot: Mutex<Option<Snapshot>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

/// Snapshot store that never touches the filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    inner: Arc<Inner>,
}

impl MemorySnapshotStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        if let Ok(mut guard) = store.inner.snapshot.lock() {
            *guard = Some(snapshot);
        }
        store
    }

    /// Makes subsequent saves fail with [`Error::PersistenceFailure`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the last saved snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.inner
            .snapshot
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    /// Returns how many saves succeeded.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.inner.saves.load(Ordering::SeqCst)
    }

    fn lock_error() -> Error {
        Error::PersistenceFailure {
            operation: "lock_memory_snapshot".to_string(),
            cause: "snapshot mutex poisoned".to_string(),
        }
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let guard = self.inner.snapshot.lock().map_err(|_| Self::lock_error())?;
        Ok(guard.clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::PersistenceFailure {
                operation: "write_snapshot".to_string(),
                cause: "writes disabled".to_string(),
            });
        }
        let mut guard = self.inner.snapshot.lock().map_err(|_| Self::lock_error())?;
        *guard = Some(snapshot.clone());
        self.inner.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self.inner.snapshot.lock().map_err(|_| Self::lock_error())?;
        *guard = None;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
