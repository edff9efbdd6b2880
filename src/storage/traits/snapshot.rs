//! Snapshot store trait.
//!
//! A snapshot store holds exactly one document: the whole table registry,
//! one named array per registered table. It is read once at startup and
//! rewritten wholesale after every mutation.
//!
//! # Available Implementations
//!
//! | Store | Use Case | Durability |
//! |-------|----------|------------|
//! | `FileSnapshotStore` | Default; single JSON file | Temp file + fsync + rename |
//! | `MemorySnapshotStore` | Tests, `--ephemeral` runs | Process lifetime |
//!
//! # Error Modes
//!
//! | Situation | `load` | `save` |
//! |-----------|--------|--------|
//! | No snapshot yet | `Ok(None)` | n/a |
//! | Content is not a valid snapshot | `Err(PersistenceFailure)` with [`PARSE_SNAPSHOT_OPERATION`] | n/a |
//! | Too large, or cannot be read | `Err(PersistenceFailure)` | n/a |
//! | Too large, or write fails | n/a | `Err(PersistenceFailure)`, previous snapshot untouched |
//!
//! Only unparsable content may be overwritten by a fresh snapshot. Anything
//! else goes through [`SnapshotStore::set_aside`] first.

use crate::storage::Snapshot;
use crate::{Error, Result};

/// Operation name `load` reports when the stored document is not a valid
/// snapshot.
pub const PARSE_SNAPSHOT_OPERATION: &str = "parse_snapshot";

/// Returns true if `error` came from a snapshot whose content could not be
/// parsed, as opposed to one that could not be read at all.
#[must_use]
pub fn is_unparsable_snapshot(error: &Error) -> bool {
    matches!(
        error,
        Error::PersistenceFailure { operation, .. } if operation == PARSE_SNAPSHOT_OPERATION
    )
}

/// Trait for whole-registry snapshot stores.
pub trait SnapshotStore: Send + Sync {
    /// Reads the stored snapshot, if one exists.
    fn load(&self) -> Result<Option<Snapshot>>;

    /// Replaces the stored snapshot.
    ///
    /// Must not return before the snapshot is durable for this store's
    /// notion of durability. On error the previous snapshot is left as it
    /// was.
    fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// Removes the stored snapshot. Removing a missing snapshot succeeds.
    fn clear(&self) -> Result<()>;

    /// Moves the stored snapshot out of the way, keeping its bytes, so a
    /// new snapshot can be saved without destroying it.
    ///
    /// Returns the location it was moved to, or `None` if there was nothing
    /// to move.
    fn set_aside(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}
