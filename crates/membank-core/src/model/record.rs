//! One stored instance of a record type

use std::collections::BTreeMap;

use super::record_type::IMPLICIT_ID;
use super::value::Value;

/// Mapping from field name to value, tagged with its table
///
/// Records read back from tables with an implicit identity also carry the
/// engine-assigned `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    table: String,
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(table: impl AsRef<str>) -> Self {
        Self {
            table: table.as_ref().to_lowercase(),
            values: BTreeMap::new(),
        }
    }

    /// Builder form of [`Record::set`]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Text value of a field, `None` when absent or not text
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_text)
    }

    /// Engine-assigned identifier, if the record carries one
    pub fn id(&self) -> Option<i64> {
        self.get(IMPLICIT_ID).and_then(Value::as_i64)
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Plain JSON object of all values
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_accessors() {
        let record = Record::new("Dog").with("breed", "Lab").with("id", 7_i64);
        assert_eq!(record.table(), "dog");
        assert_eq!(record.text("breed"), Some("Lab"));
        assert_eq!(record.id(), Some(7));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_to_json_is_untagged() {
        let record = Record::new("dog").with("weight", 2.5).with("good", true);
        assert_eq!(
            record.to_json(),
            serde_json::json!({"weight": 2.5, "good": true})
        );
    }
}
