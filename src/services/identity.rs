//! Record identity resolution across key-naming conventions.
//!
//! Entities in the storefront grew up with different primary-key names:
//! most use `id`, a few legacy collections use `ID`, and profile-style
//! tables are keyed by `user_id`. Updates and deletes carry a single key
//! value, and the target is found by trying each convention in turn:
//!
//! 1. a record whose `id` loosely equals the key,
//! 2. else a record whose `ID` loosely equals the key,
//! 3. else a record whose `user_id` loosely equals the key.
//!
//! Each rule scans the whole table before the next rule is tried, so a
//! record matching by `id` always wins over an earlier record matching by
//! `user_id`. The order must not change: the same value can validly appear
//! under more than one convention.

use crate::models::{Record, Value};
use crate::{Error, Result};

/// Key field names, in resolution order.
pub const KEY_FIELDS: [&str; 3] = ["id", "ID", "user_id"];

/// Canonical key field assigned to newly created records.
pub const CANONICAL_KEY: &str = KEY_FIELDS[0];

/// A located record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// Position of the record in its table.
    pub index: usize,
    /// Key field that matched.
    pub field: &'static str,
}

/// Locates the record addressed by `key`.
#[must_use]
pub fn locate(records: &[Record], key: &Value) -> Option<Resolved> {
    if key.is_null() {
        return None;
    }

    KEY_FIELDS.iter().find_map(|&field| {
        records
            .iter()
            .position(|record| {
                record
                    .get_present(field)
                    .is_some_and(|value| value.loose_eq(key))
            })
            .map(|index| Resolved { index, field })
    })
}

/// Locates the record addressed by `key`, failing with
/// [`Error::RecordNotFound`].
pub fn resolve(records: &[Record], key: &Value) -> Result<Resolved> {
    locate(records, key).ok_or_else(|| Error::RecordNotFound(key.to_string()))
}

/// Extracts the addressing key from a request body.
///
/// Uses the same precedence as resolution and returns the field name it was
/// read from, so callers can leave that field out of a merge.
pub fn extract_key(body: &Record) -> Result<(&'static str, Value)> {
    KEY_FIELDS
        .iter()
        .find_map(|&field| body.get_present(field).map(|value| (field, value.clone())))
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "request must carry a record key in one of: {}",
                KEY_FIELDS.join(", ")
            ))
        })
}
