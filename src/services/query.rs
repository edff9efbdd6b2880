//! Query execution: filter, sort, count, slice.

use super::predicate;
use crate::models::{Page, Query, Record, Value};
use std::cmp::Ordering;

static NULL: Value = Value::Null;

/// Executes `query` against `records` and returns one page.
///
/// Steps, in order:
/// 1. keep records satisfying every filter, preserving insertion order;
/// 2. if a sort field is set, stable-sort by it in the requested direction;
/// 3. count the matches (`VirtualCount`);
/// 4. slice `[(PageNo - 1) * PageSize, PageNo * PageSize)`.
///
/// Pages past the end are empty, never an error.
#[must_use]
pub fn execute(records: &[Record], query: &Query) -> Page {
    let mut matched: Vec<&Record> = records
        .iter()
        .filter(|record| predicate::matches_all(record, &query.filters))
        .collect();

    if let Some(field) = query.order_by() {
        sort_by_field(&mut matched, field, query.is_asc());
    }

    let virtual_count = matched.len();
    let page_no = query.page_no();
    let page_size = query.page_size();
    let start = (page_no - 1).saturating_mul(page_size);

    let list = matched
        .into_iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    Page {
        list,
        virtual_count,
        page_no,
        page_size,
    }
}

/// Counts records satisfying every filter of `query`, ignoring pagination.
#[must_use]
pub fn count(records: &[Record], query: &Query) -> usize {
    records
        .iter()
        .filter(|record| predicate::matches_all(record, &query.filters))
        .count()
}

/// Stable sort on one field. Missing fields sort like `null`.
fn sort_by_field(records: &mut [&Record], field: &str, ascending: bool) {
    let compare = |a: &Record, b: &Record| -> Ordering {
        let left = a.get(field).unwrap_or(&NULL);
        let right = b.get(field).unwrap_or(&NULL);
        left.sort_cmp(right)
    };

    // `sort_by` is stable; reversing the comparator rather than the output
    // keeps ties in insertion order for descending sorts too.
    if ascending {
        records.sort_by(|a, b| compare(a, b));
    } else {
        records.sort_by(|a, b| compare(b, a));
    }
}
