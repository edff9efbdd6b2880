//! Table command handlers.

use super::{open_service, print_json};
use anyhow::{Context, bail};
use serde_json::json;
use storefront::config::StorefrontConfig;
use storefront::models::{Filter, FilterOp, Query, Record, Value};
use storefront::services::TableApi;

/// Parses a `name:op:value` filter argument.
///
/// The value may itself contain colons.
pub fn parse_filter(arg: &str) -> anyhow::Result<Filter> {
    let mut parts = arg.splitn(3, ':');
    let (Some(name), Some(op), Some(value)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("filter '{arg}' must have the form name:op:value");
    };
    if name.is_empty() {
        bail!("filter '{arg}' has an empty field name");
    }
    let Some(op) = FilterOp::parse(op) else {
        bail!("filter '{arg}' has unknown operator '{op}' (use Equal, NotEqual, Like or NotLike)");
    };
    Ok(Filter::new(name, op, parse_scalar(value)))
}

/// Reads a command-line value as a JSON scalar, falling back to a string.
pub fn parse_scalar(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|json| Value::try_from(json).ok())
        .unwrap_or_else(|| Value::from(raw))
}

fn parse_record(raw: &str) -> anyhow::Result<Record> {
    let json: serde_json::Value = serde_json::from_str(raw).context("record must be valid JSON")?;
    Ok(Record::from_json(json)?)
}

/// Tables command.
pub fn cmd_tables(config: &StorefrontConfig) -> anyhow::Result<()> {
    let service = open_service(config)?;
    let tables: Vec<_> = service
        .table_counts()
        .into_iter()
        .map(|(id, count)| json!({"id": id.as_str(), "count": count}))
        .collect();
    print_json(&tables)
}

/// Page command.
pub fn cmd_page(
    config: &StorefrontConfig,
    table: &str,
    page_no: Option<usize>,
    page_size: Option<usize>,
    order_by: Option<String>,
    desc: bool,
    filters: &[String],
) -> anyhow::Result<()> {
    let mut query = Query {
        page_no,
        page_size,
        order_by_field: order_by,
        is_asc: Some(!desc),
        ..Query::default()
    };
    for raw in filters {
        query = query.with_filter(parse_filter(raw)?);
    }

    let service = open_service(config)?;
    print_json(&service.page(table, &query)?)
}

/// Create command.
pub fn cmd_create(config: &StorefrontConfig, table: &str, record: &str) -> anyhow::Result<()> {
    let record = parse_record(record)?;
    let mut service = open_service(config)?;
    print_json(&service.create(table, record)?)
}

/// Update command.
pub fn cmd_update(config: &StorefrontConfig, table: &str, patch: &str) -> anyhow::Result<()> {
    let patch = parse_record(patch)?;
    let mut service = open_service(config)?;
    print_json(&service.update(table, patch)?)
}

/// Delete command.
pub fn cmd_delete(config: &StorefrontConfig, table: &str, key: &str) -> anyhow::Result<()> {
    let key = parse_scalar(key);
    let mut service = open_service(config)?;
    service.delete(table, &key)?;
    print_json(&json!({"success": true}))
}

/// Reset command.
pub fn cmd_reset(config: &StorefrontConfig) -> anyhow::Result<()> {
    let mut service = open_service(config)?;
    service.reset();
    print_json(&json!({"success": true, "records": service.registry().record_count()}))
}
