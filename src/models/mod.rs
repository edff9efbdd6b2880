//! Data models for the storefront record store.
//!
//! This module contains the core data structures shared by the storage layer,
//! the query services, and the HTTP surface.

mod query;
mod record;
mod table;
mod value;

pub use query::{DEFAULT_PAGE_NO, DEFAULT_PAGE_SIZE, Filter, FilterOp, Page, Query};
pub use record::Record;
pub use table::TableId;
pub use value::Value;
