//! Rows and columns as seen by the engine, independent of the source flavour.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One column of the remote table. Relational sources use the column name as id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub name: String,
}

impl Column {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A fetched row. Rebuilt wholesale on each fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    pub display_name: String,
    pub fields: BTreeMap<String, Value>,
}

impl Row {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style helper, mostly handy in tests and fixtures.
    pub fn with_field(mut self, column_id: impl Into<String>, value: Value) -> Self {
        self.fields.insert(column_id.into(), value);
        self
    }

    pub fn value(&self, column_id: &str) -> Option<&Value> {
        self.fields.get(column_id)
    }

    /// Trimmed textual form of a field; empty when missing or null.
    pub fn text(&self, column_id: &str) -> String {
        self.value(column_id)
            .map(value_text)
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    /// Numeric form of a field, accepting numbers and numeric strings.
    pub fn number(&self, column_id: &str) -> Option<f64> {
        self.value(column_id).and_then(value_number)
    }
}

/// Render a JSON cell the way a user would read it.
pub fn value_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .get("name")
            .map(value_text)
            .unwrap_or_else(|| v.to_string()),
    }
}

pub fn value_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_trims_and_flattens() {
        let row = Row::new("r1", "Task")
            .with_field("c-day", json!("  Lundi "))
            .with_field("c-owner", json!(["Ana", "Bo"]))
            .with_field("c-empty", Value::Null);

        assert_eq!(row.text("c-day"), "Lundi");
        assert_eq!(row.text("c-owner"), "Ana, Bo");
        assert_eq!(row.text("c-empty"), "");
        assert_eq!(row.text("c-missing"), "");
    }

    #[test]
    fn number_accepts_strings() {
        let row = Row::new("r1", "Task")
            .with_field("p1", json!(0.25))
            .with_field("p2", json!("40%"))
            .with_field("p3", json!("n/a"));

        assert_eq!(row.number("p1"), Some(0.25));
        assert_eq!(row.number("p2"), Some(40.0));
        assert_eq!(row.number("p3"), None);
    }
}
