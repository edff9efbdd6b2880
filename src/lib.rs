//! # Storefront
//!
//! The record store behind an e-commerce storefront.
//!
//! Every CRUD-style entity (users, profiles, orders, notifications,
//! campaigns, products, categories) lives in one of a fixed set of
//! schema-less tables and is reached through the same four operations:
//! `page`, `create`, `update` and `delete`.
//!
//! ## Features
//!
//! - Declarative filters (`Equal`, `NotEqual`, `Like`, `NotLike`) with loose,
//!   documented cross-type equality
//! - Stable single-field sorting and bounded pagination
//! - Key resolution across the `id` / `ID` / `user_id` conventions
//! - Write-through JSON snapshot of the whole registry after every mutation
//! - JSON-over-HTTP surface (axum) and a matching blocking HTTP client
//!
//! ## Example
//!
//! ```rust
//! use storefront::models::{Filter, Query, Record, TableId};
//! use storefront::services::{TableApi, TableService};
//! use storefront::storage::MemorySnapshotStore;
//!
//! let mut service = TableService::open(Box::new(MemorySnapshotStore::new()));
//! let created = service
//!     .create("notifications", Record::from_iter([("user_id", "42"), ("title", "Hi")]))
//!     .unwrap();
//! assert!(created.get("id").is_some());
//!
//! let page = service
//!     .page(
//!         TableId::Notifications.as_str(),
//!         &Query::new().with_filter(Filter::equal("user_id", 42_i64)),
//!     )
//!     .unwrap();
//! assert_eq!(page.virtual_count, 1);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod client;
pub mod config;
#[cfg(feature = "http")]
pub mod http;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::StorefrontConfig;
pub use models::{Filter, FilterOp, Page, Query, Record, TableId, Value};
pub use services::{TableApi, TableService};
pub use storage::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore, TableRegistry};

/// Error type for storefront operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `TableNotFound` | A table identifier outside the registered set is used |
/// | `RecordNotFound` | `update`/`delete` cannot resolve the addressed record |
/// | `InvalidInput` | Non-object bodies, nested field values, missing record key |
/// | `PersistenceFailure` | The snapshot cannot be read or written |
/// | `OperationFailed` | Config, server, or HTTP client I/O fails |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The table identifier is not registered.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// No record matched the key under any key convention.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A create/update body is not a JSON object
    /// - A field holds an array or object
    /// - An update/delete body carries no `id`, `ID` or `user_id`
    /// - A filter names an unknown operator
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The snapshot could not be read or written.
    ///
    /// After a mutation this is logged and swallowed: the in-memory change
    /// stands and the caller still sees success.
    #[error("persistence '{operation}' failed: {cause}")]
    PersistenceFailure {
        /// The persistence step that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// An operation failed.
    ///
    /// Raised when:
    /// - The configuration file cannot be read or parsed
    /// - The HTTP listener cannot bind
    /// - The HTTP client cannot reach the server or decode its reply
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for storefront operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TableNotFound("carts2".to_string());
        assert_eq!(err.to_string(), "table not found: carts2");

        let err = Error::RecordNotFound("missing-id".to_string());
        assert_eq!(err.to_string(), "record not found: missing-id");

        let err = Error::PersistenceFailure {
            operation: "write_snapshot".to_string(),
            cause: "disk full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "persistence 'write_snapshot' failed: disk full"
        );
    }
}
