//! Property-based tests for the query layer.
//!
//! Uses proptest to verify invariants across random inputs:
//! - An empty filter list counts every record
//! - `%s%` matches exactly when `s` is a substring
//! - Pages never exceed their size, and a small result fits on page one
//! - Repeated queries return identical pages
//! - Sorting is stable in both directions

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use storefront::models::{Filter, FilterOp, Query, Record, Value};
use storefront::services::predicate;
use storefront::services::query::execute;

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-50_i64..50).prop_map(Value::from),
        "[a-z0-9]{0,6}".prop_map(Value::from),
    ]
}

fn records(max: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(
        (scalar(), scalar(), 0_i64..5).prop_map(|(a, b, group)| {
            Record::from_iter([
                ("a", a),
                ("b", b),
                ("group", Value::from(group)),
            ])
        }),
        0..max,
    )
}

proptest! {
    /// Property: with no filters, `VirtualCount` is the table size.
    #[test]
    fn prop_empty_filters_count_everything(
        data in records(60),
        page_no in 0_usize..10,
        page_size in 0_usize..20,
    ) {
        let query = Query::new().with_page(page_no, page_size);
        let page = execute(&data, &query);
        prop_assert_eq!(page.virtual_count, data.len());
    }

    /// Property: `%s%` matches iff `s` is a contiguous substring.
    #[test]
    fn prop_like_contains_iff_substring(text in "[a-z@.]{0,12}", sub in "[a-z]{0,4}") {
        let record = Record::from_iter([("email", text.as_str())]);
        let filter = Filter::new("email", FilterOp::Like, format!("%{sub}%"));
        prop_assert_eq!(predicate::matches(&record, &filter), text.contains(&sub));
        prop_assert_eq!(predicate::like(&text, &format!("%{sub}%")), text.contains(&sub));
    }

    /// Property: `NotLike` is the negation of `Like` on present string fields.
    #[test]
    fn prop_not_like_negates_like(text in "[a-c]{0,6}", pattern in "%?[a-c]{0,3}%?") {
        let record = Record::from_iter([("f", text.as_str())]);
        let like = Filter::new("f", FilterOp::Like, pattern.as_str());
        let not_like = Filter::new("f", FilterOp::NotLike, pattern.as_str());
        prop_assert_ne!(predicate::matches(&record, &like), predicate::matches(&record, &not_like));
    }

    /// Property: page bounds hold for any filter and slice.
    #[test]
    fn prop_page_bounds(
        data in records(60),
        group in 0_i64..5,
        page_no in 1_usize..8,
        page_size in 1_usize..15,
    ) {
        let query = Query::new()
            .with_page(page_no, page_size)
            .with_filter(Filter::equal("group", group));
        let page = execute(&data, &query);

        prop_assert!(page.list.len() <= page_size);
        if page.virtual_count <= page_size && page_no == 1 {
            prop_assert_eq!(page.list.len(), page.virtual_count);
        }
        prop_assert!(page.list.iter().all(|r| r.get("group") == Some(&Value::from(group))));
    }

    /// Property: identical queries give identical pages.
    #[test]
    fn prop_queries_are_idempotent(data in records(40), asc in any::<bool>()) {
        let query = Query::new().with_order("a", asc).with_page(1, 100);
        prop_assert_eq!(execute(&data, &query), execute(&data, &query));
    }

    /// Property: records with equal sort keys keep insertion order.
    #[test]
    fn prop_sort_is_stable(data in records(40), asc in any::<bool>()) {
        let indexed: Vec<Record> = data
            .into_iter()
            .enumerate()
            .map(|(i, mut r)| {
                r.insert("seq", i64::try_from(i).unwrap());
                r
            })
            .collect();

        let query = Query::new().with_order("group", asc).with_page(1, 100);
        let page = execute(&indexed, &query);

        for pair in page.list.windows(2) {
            if pair[0].get("group") == pair[1].get("group") {
                let first = pair[0].get("seq").and_then(Value::as_f64).unwrap();
                let second = pair[1].get("seq").and_then(Value::as_f64).unwrap();
                prop_assert!(first < second);
            }
        }
    }
}
