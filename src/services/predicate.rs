//! Filter predicate evaluation.
//!
//! Decides whether one [`Record`] satisfies one [`Filter`]:
//!
//! - `Equal` / `NotEqual` use [`Value::loose_eq`].
//! - `Like` / `NotLike` use restricted `%` wildcards: `%x%` tests containment,
//!   `%x` a suffix, `x%` a prefix, and a pattern without a leading or trailing
//!   `%` is compared exactly. A `%` anywhere else is a literal character.
//!   Both sides must be strings, otherwise the predicate is false.
//! - A field that is absent or `null` on the record fails every operator,
//!   including the negated ones.

use crate::models::{Filter, FilterOp, Record, Value};

/// Returns true if `record` satisfies `filter`.
#[must_use]
pub fn matches(record: &Record, filter: &Filter) -> bool {
    let Some(field) = record.get_present(&filter.name) else {
        return false;
    };

    match filter.op {
        FilterOp::Equal => field.loose_eq(&filter.value),
        FilterOp::NotEqual => !field.loose_eq(&filter.value),
        FilterOp::Like => string_operands(field, &filter.value).is_some_and(|(s, p)| like(s, p)),
        FilterOp::NotLike => string_operands(field, &filter.value).is_some_and(|(s, p)| !like(s, p)),
    }
}

/// Returns true if `record` satisfies every filter. An empty list matches.
#[must_use]
pub fn matches_all(record: &Record, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| matches(record, filter))
}

/// Restricted SQL-style wildcard match.
#[must_use]
pub fn like(text: &str, pattern: &str) -> bool {
    let leading = pattern.starts_with('%');
    let trailing = pattern.len() >= 2 && pattern.ends_with('%');

    match (leading, trailing) {
        (true, true) => text.contains(&pattern[1..pattern.len() - 1]),
        (true, false) => text.ends_with(&pattern[1..]),
        (false, true) => text.starts_with(&pattern[..pattern.len() - 1]),
        (false, false) => text == pattern,
    }
}

fn string_operands<'a>(field: &'a Value, pattern: &'a Value) -> Option<(&'a str, &'a str)> {
    Some((field.as_str()?, pattern.as_str()?))
}
