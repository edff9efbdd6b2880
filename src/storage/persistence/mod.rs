//! Snapshot store implementations.

mod filesystem;
mod memory;

pub use filesystem::{
    DEFAULT_SNAPSHOT_FILE, FileSnapshotStore, MAX_SNAPSHOT_SIZE, SET_ASIDE_SUFFIX,
};
pub use memory::MemorySnapshotStore;
