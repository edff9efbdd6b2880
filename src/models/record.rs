//! Schema-less records.

use super::Value;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entity instance: a mapping from field name to scalar value.
///
/// Records in the same table may carry different field sets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builds a record from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `json` is not an object or any
    /// field holds an array or object.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = json else {
            return Err(Error::InvalidInput(format!(
                "record must be a JSON object, got {}",
                json_kind(&json)
            )));
        };

        let mut record = Self::new();
        for (field, value) in map {
            let value = Value::try_from(value).map_err(|_| {
                Error::InvalidInput(format!("field '{field}' must hold a scalar value"))
            })?;
            record.0.insert(field, value);
        }
        Ok(record)
    }

    /// Returns the value of `field`, if set.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns the value of `field` unless it is absent or `null`.
    #[must_use]
    pub fn get_present(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// Sets `field`, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Removes `field`, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Shallow-merges `patch` into this record.
    ///
    /// Every field of `patch` overwrites the same field here, except those
    /// named in `skip_fields`. Fields not named in the patch are retained.
    pub fn merge(&mut self, patch: &Self, skip_fields: &[&str]) {
        for (field, value) in &patch.0 {
            if skip_fields.contains(&field.as_str()) {
                continue;
            }
            self.0.insert(field.clone(), value.clone());
        }
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Record> for serde_json::Value {
    fn from(record: Record) -> Self {
        Self::Object(
            record
                .0
                .into_iter()
                .map(|(k, v)| (k, v.into()))
                .collect(),
        )
    }
}

const fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_object() {
        let record = Record::from_json(json!({"id": 7, "name": "Mug", "active": true})).unwrap();
        assert_eq!(record.len(), 3);
        assert_eq!(record.get("name"), Some(&Value::from("Mug")));
        assert_eq!(record.get("id"), Some(&Value::from(7_i64)));
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        let err = Record::from_json(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_from_json_rejects_nested_fields() {
        let err = Record::from_json(json!({"tags": ["a"]})).unwrap_err();
        assert!(err.to_string().contains("'tags'"));
    }

    #[test]
    fn test_get_present_skips_null() {
        let record = Record::from_json(json!({"a": null, "b": 0})).unwrap();
        assert!(record.get("a").is_some());
        assert!(record.get_present("a").is_none());
        assert!(record.get_present("b").is_some());
        assert!(record.get_present("c").is_none());
    }

    #[test]
    fn test_merge_is_shallow_and_keeps_unspecified_fields() {
        let mut record = Record::from_json(json!({"id": "n1", "title": "Hi", "status": "new"})).unwrap();
        let patch = Record::from_json(json!({"id": "other", "status": "read"})).unwrap();

        record.merge(&patch, &["id"]);

        assert_eq!(record.get("id"), Some(&Value::from("n1")));
        assert_eq!(record.get("title"), Some(&Value::from("Hi")));
        assert_eq!(record.get("status"), Some(&Value::from("read")));
    }

    #[test]
    fn test_merge_skips_every_named_field() {
        let mut record = Record::from_json(json!({"id": "n1", "user_id": "42"})).unwrap();
        let patch = Record::from_json(json!({"id": null, "user_id": "42", "bio": "x"})).unwrap();

        record.merge(&patch, &["id", "user_id"]);

        assert_eq!(record, Record::from_json(json!({"id": "n1", "user_id": "42", "bio": "x"})).unwrap());
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let record: Record = [("b", Value::from(1_i64)), ("a", Value::from("x"))]
            .into_iter()
            .collect();
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"a":"x","b":1}"#);
    }
}
