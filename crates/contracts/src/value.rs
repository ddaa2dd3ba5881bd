//! Measurement values, source readings and sink rows

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single measured value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }

    /// Text view of the value, if it is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Result of one source read: variable name -> value (`None` = value missing).
///
/// A declared variable absent from the map is missing as well.
pub type Reading = HashMap<String, Option<Value>>;

/// One row handed to a sink, in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, Option<Value>)>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row with room for `capacity` columns
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a column
    pub fn push(&mut self, key: impl Into<String>, value: Option<Value>) {
        self.entries.push((key.into(), value));
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the row has no columns
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Column keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Columns in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Columns that carry a value
    pub fn present(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.as_str(), v)))
    }

    /// Value of a column; `None` if the column is absent or its value missing
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Whether the row has a column with this key
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }
}

impl FromIterator<(String, Option<Value>)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Option<Value>)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_display() {
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::from("abc").to_string(), "abc");
    }

    #[test]
    fn value_untagged_json() {
        let v: Value = serde_json::from_str("12").unwrap();
        assert_eq!(v, Value::Int(12));
        let v: Value = serde_json::from_str("12.25").unwrap();
        assert_eq!(v, Value::Float(12.25));
        let v: Value = serde_json::from_str("\"on\"").unwrap();
        assert_eq!(v, Value::Text("on".into()));
    }

    #[test]
    fn row_keeps_column_order() {
        let mut row = Row::new();
        row.push("b", Some(Value::Int(1)));
        row.push("a", None);
        row.push("c", Some(Value::Int(3)));

        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(row.len(), 3);
        assert!(row.contains_key("a"));
        assert_eq!(row.value("a"), None);
        assert_eq!(row.value("c"), Some(&Value::Int(3)));
        assert_eq!(row.present().count(), 2);
    }
}
