use crate::core::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single row keyed by column name.
///
/// Column order is the order in which fields were inserted, which is also the
/// order used when the record is turned into an INSERT column list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns the field value or `Value::Null` when it is absent.
    pub fn get_value(&self, field: &str) -> Value {
        self.get(field).cloned().unwrap_or(Value::Null)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value.into());
        self
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), serde_json::Value::from(value)))
                .collect(),
        )
    }

    /// Builds a record from a JSON object. Non-object input yields `None`.
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        Self::try_from(json).ok()
    }
}

impl TryFrom<serde_json::Value> for Record {
    type Error = String;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match Value::from(json) {
            Value::Record(record) => Ok(record),
            other => Err(format!("expected a JSON object, got {other}")),
        }
    }
}

impl From<Record> for serde_json::Value {
    fn from(record: Record) -> Self {
        record.to_json()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insertion_order_is_preserved() {
        let record = Record::new()
            .with("title", "Hello")
            .with("author_id", 3)
            .with("published", true);

        let keys: Vec<_> = record.keys().cloned().collect();
        assert_eq!(keys, vec!["title", "author_id", "published"]);
    }

    #[test]
    fn test_missing_field_reads_as_null() {
        let record = Record::new().with("id", 1);
        assert_eq!(record.get_value("missing"), Value::Null);
    }

    #[test]
    fn test_from_json_keeps_key_order() {
        let record: Record =
            serde_json::from_value(json!({"title": "Hi", "author_id": 1, "body": "x"})).unwrap();
        let keys: Vec<_> = record.keys().cloned().collect();
        assert_eq!(keys, vec!["title", "author_id", "body"]);
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert!(Record::from_json(json!([1, 2])).is_none());
        let record = Record::from_json(json!({"id": 5})).unwrap();
        assert_eq!(record.get("id"), Some(&Value::Int(5)));
    }
}
