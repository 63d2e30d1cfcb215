//! Typed cell values for row tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell of a row table.
///
/// Column types are inferred at ingestion: a column whose every non-empty
/// cell parses as a float is numeric, everything else stays text. Empty cells
/// and failed numeric coercions are `Missing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Best-effort numeric view of the cell. Text cells are parsed; missing
    /// cells and unparseable text yield `None` and never satisfy a predicate.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// The serialized form of the cell, as written to output tables.
    ///
    /// Missing cells render empty, so rows compare equal under dedup exactly
    /// when their serialized forms are identical.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Missing => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_number_from_number() {
        assert_eq!(Value::Number(2.5).as_number(), Some(2.5));
    }

    #[test]
    fn test_as_number_parses_text() {
        assert_eq!(Value::Text(" 42 ".into()).as_number(), Some(42.0));
    }

    #[test]
    fn test_as_number_rejects_garbage() {
        assert_eq!(Value::Text("n/a".into()).as_number(), None);
        assert_eq!(Value::Missing.as_number(), None);
    }

    #[test]
    fn test_render_missing_is_empty() {
        assert_eq!(Value::Missing.render(), "");
    }

    #[test]
    fn test_render_number_round_trip() {
        assert_eq!(Value::Number(1.0).render(), "1");
        assert_eq!(Value::Number(0.25).render(), "0.25");
    }

    #[test]
    fn test_serializes_untagged() {
        let cells = vec![Value::Number(1.5), Value::Text("a".into()), Value::Missing];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[1.5,"a",null]"#);
    }
}
