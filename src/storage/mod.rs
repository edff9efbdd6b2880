//! Storage layer.
//!
//! - **Registry**: the fixed set of in-memory tables ([`TableRegistry`])
//! - **Persistence**: whole-registry snapshots ([`SnapshotStore`])
//! - **Seed**: deterministic data installed when no snapshot exists

pub mod persistence;
mod registry;
pub mod seed;
pub mod traits;

pub use persistence::{
    DEFAULT_SNAPSHOT_FILE, FileSnapshotStore, MAX_SNAPSHOT_SIZE, MemorySnapshotStore,
    SET_ASIDE_SUFFIX,
};
pub use registry::{Snapshot, Table, TableRegistry};
pub use seed::seed_registry;
pub use traits::{PARSE_SNAPSHOT_OPERATION, SnapshotStore, is_unparsable_snapshot};
