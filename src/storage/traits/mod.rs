//! Storage backend traits.

mod snapshot;

pub use snapshot::{PARSE_SNAPSHOT_OPERATION, SnapshotStore, is_unparsable_snapshot};
