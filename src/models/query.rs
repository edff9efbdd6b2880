//! Query and page types for the table protocol.
//!
//! Wire names follow the storefront's browser client: `PageNo`, `PageSize`,
//! `OrderByField`, `IsAsc`, `Filters` on the way in and `List`,
//! `VirtualCount`, `PageNo`, `PageSize` on the way out.

use super::{Record, Value};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Page number used when a query omits one.
pub const DEFAULT_PAGE_NO: usize = 1;

/// Page size used when a query omits one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Comparison operator of a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    /// Loose equality.
    #[serde(alias = "equal", alias = "eq", alias = "=")]
    Equal,
    /// Negated loose equality.
    #[serde(alias = "notEqual", alias = "not_equal", alias = "ne", alias = "!=")]
    NotEqual,
    /// Restricted `%` wildcard match on strings.
    #[serde(alias = "like")]
    Like,
    /// Negated wildcard match on strings.
    #[serde(alias = "notLike", alias = "not_like")]
    NotLike,
}

impl FilterOp {
    /// Returns the operator's wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "Equal",
            Self::NotEqual => "NotEqual",
            Self::Like => "Like",
            Self::NotLike => "NotLike",
        }
    }

    /// Parses an operator name, accepting the same aliases as the wire form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "equal" | "eq" | "=" => Some(Self::Equal),
            "notequal" | "not_equal" | "ne" | "!=" => Some(Self::NotEqual),
            "like" => Some(Self::Like),
            "notlike" | "not_like" => Some(Self::NotLike),
            _ => None,
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single `(field, operator, value)` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field name the predicate reads.
    pub name: String,
    /// Comparison operator.
    pub op: FilterOp,
    /// Operand.
    #[serde(default)]
    pub value: Value,
}

impl Filter {
    /// Creates a filter.
    #[must_use]
    pub fn new(name: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            op,
            value: value.into(),
        }
    }

    /// Shorthand for an [`FilterOp::Equal`] filter.
    #[must_use]
    pub fn equal(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(name, FilterOp::Equal, value)
    }

    /// Shorthand for a [`FilterOp::Like`] filter.
    #[must_use]
    pub fn like(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(name, FilterOp::Like, Value::String(pattern.into()))
    }
}

/// A page request against one table.
///
/// Every field is optional on the wire. Missing or malformed pagination and
/// sort inputs are never an error: the accessors fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Query {
    /// 1-based page number.
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub page_no: Option<usize>,
    /// Records per page.
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    /// Field to sort by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by_field: Option<String>,
    /// Sort direction; ascending unless `false`.
    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub is_asc: Option<bool>,
    /// Predicates, combined with AND.
    #[serde(default, deserialize_with = "nullable_filters")]
    pub filters: Vec<Filter>,
}

impl Query {
    /// Creates a query with every input defaulted.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            page_no: None,
            page_size: None,
            order_by_field: None,
            is_asc: None,
            filters: Vec::new(),
        }
    }

    /// Sets the page number and size.
    #[must_use]
    pub const fn with_page(mut self, page_no: usize, page_size: usize) -> Self {
        self.page_no = Some(page_no);
        self.page_size = Some(page_size);
        self
    }

    /// Sets the sort field and direction.
    #[must_use]
    pub fn with_order(mut self, field: impl Into<String>, is_asc: bool) -> Self {
        self.order_by_field = Some(field.into());
        self.is_asc = Some(is_asc);
        self
    }

    /// Adds a filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Effective page number, at least 1.
    #[must_use]
    pub fn page_no(&self) -> usize {
        self.page_no.filter(|n| *n >= 1).unwrap_or(DEFAULT_PAGE_NO)
    }

    /// Effective page size, at least 1.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size.filter(|n| *n >= 1).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Effective sort field; blank names mean unsorted.
    #[must_use]
    pub fn order_by(&self) -> Option<&str> {
        self.order_by_field
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Effective sort direction.
    #[must_use]
    pub fn is_asc(&self) -> bool {
        self.is_asc.unwrap_or(true)
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Page {
    /// Records on this page, at most `page_size` of them.
    pub list: Vec<Record>,
    /// Number of records matching every filter, before slicing.
    pub virtual_count: usize,
    /// Page number that was served.
    pub page_no: usize,
    /// Page size that was served.
    pub page_size: usize,
}

/// Accepts a positive count as a number or numeric string; anything else is
/// treated as absent.
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let count = match raw {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 1.0).map(f64_to_u64)),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(count.and_then(|n| usize::try_from(n).ok()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn f64_to_u64(f: f64) -> u64 {
    f.floor() as u64
}

/// Accepts `true`/`false`, their string forms, or `1`/`0`.
fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::Bool(b) => Some(b),
        serde_json::Value::Number(n) => n.as_i64().map(|i| i != 0),
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn nullable_filters<'de, D>(deserializer: D) -> std::result::Result<Vec<Filter>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Filter>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_body_uses_defaults() {
        let query: Query = serde_json::from_value(json!({})).unwrap();
        assert_eq!(query.page_no(), 1);
        assert_eq!(query.page_size(), 10);
        assert_eq!(query.order_by(), None);
        assert!(query.is_asc());
        assert!(query.filters.is_empty());
    }

    #[test]
    fn test_full_body() {
        let query: Query = serde_json::from_value(json!({
            "PageNo": 2,
            "PageSize": 25,
            "OrderByField": "price",
            "IsAsc": false,
            "Filters": [{"name": "email", "op": "Like", "value": "%admin%"}]
        }))
        .unwrap();

        assert_eq!(query.page_no(), 2);
        assert_eq!(query.page_size(), 25);
        assert_eq!(query.order_by(), Some("price"));
        assert!(!query.is_asc());
        assert_eq!(query.filters, vec![Filter::like("email", "%admin%")]);
    }

    #[test]
    fn test_malformed_pagination_is_defaulted() {
        let query: Query = serde_json::from_value(json!({
            "PageNo": 0,
            "PageSize": "lots",
            "OrderByField": "   ",
            "IsAsc": null,
            "Filters": null
        }))
        .unwrap();

        assert_eq!(query.page_no(), 1);
        assert_eq!(query.page_size(), 10);
        assert_eq!(query.order_by(), None);
        assert!(query.is_asc());
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let query: Query =
            serde_json::from_value(json!({"PageNo": "3", "PageSize": "5", "IsAsc": "false"}))
                .unwrap();
        assert_eq!(query.page_no(), 3);
        assert_eq!(query.page_size(), 5);
        assert!(!query.is_asc());
    }

    #[test]
    fn test_negative_page_is_defaulted() {
        let query: Query = serde_json::from_value(json!({"PageNo": -4})).unwrap();
        assert_eq!(query.page_no(), 1);
    }

    #[test]
    fn test_operator_aliases() {
        let filter: Filter =
            serde_json::from_value(json!({"name": "a", "op": "notLike", "value": "x%"})).unwrap();
        assert_eq!(filter.op, FilterOp::NotLike);
        assert_eq!(FilterOp::parse("!="), Some(FilterOp::NotEqual));
        assert_eq!(FilterOp::parse("LIKE"), Some(FilterOp::Like));
        assert_eq!(FilterOp::parse("between"), None);
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let result: std::result::Result<Filter, _> =
            serde_json::from_value(json!({"name": "a", "op": "Between", "value": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_page_wire_names() {
        let page = Page {
            list: Vec::new(),
            virtual_count: 0,
            page_no: 1,
            page_size: 10,
        };
        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({"List": [], "VirtualCount": 0, "PageNo": 1, "PageSize": 10})
        );
    }

    #[test]
    fn test_query_serializes_only_set_fields() {
        let query = Query::new().with_page(2, 5);
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"PageNo": 2, "PageSize": 5, "Filters": []})
        );
    }
}
