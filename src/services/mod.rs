//! Business logic services.
//!
//! Services sit between callers and the storage layer. The leaves
//! ([`predicate`], [`query`], [`identity`]) are pure functions over record
//! slices; [`TableService`] composes them with the registry and the snapshot
//! store behind the [`TableApi`] contract.

pub mod identity;
pub mod predicate;
pub mod query;
mod table;

pub use identity::{KEY_FIELDS, Resolved};
pub use table::{TableApi, TableService};
