//! Attribute values carried by IR nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single attribute value.
///
/// Absence is expressed with `Option<AttrValue>`, never with a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Text
    Str(String),
    /// Boolean flag
    Bool(bool),
    /// Integer
    Int(i64),
    /// Ordered list of values
    List(Vec<AttrValue>),
}

impl AttrValue {
    /// Borrow as text, if this is a string value
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as boolean, if this is a boolean value
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the value kind, used in diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::List(_) => "list",
        }
    }

    /// Convert into a JSON value for structured output
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
        }
    }
}

/// Text rendering used when a non-string value is coerced for matching.
impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

/// Whether an optional value counts as set for inheritance purposes.
///
/// Unset and empty strings both fall through to the parent.
#[must_use]
pub fn is_present(value: Option<&AttrValue>) -> bool {
    match value {
        None => false,
        Some(AttrValue::Str(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_coercion() {
        assert_eq!(AttrValue::Bool(true).to_string(), "true");
        assert_eq!(AttrValue::Int(42).to_string(), "42");
        assert_eq!(AttrValue::from("abc").to_string(), "abc");
        let list = AttrValue::List(vec![AttrValue::from("a"), AttrValue::Int(1)]);
        assert_eq!(list.to_string(), "[a, 1]");
    }

    #[test]
    fn test_is_present() {
        assert!(!is_present(None));
        assert!(!is_present(Some(&AttrValue::from(""))));
        assert!(is_present(Some(&AttrValue::from("x"))));
        assert!(is_present(Some(&AttrValue::Bool(false))));
    }

    #[test]
    fn test_untagged_serde() {
        let v: AttrValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, AttrValue::Bool(true));
        let v: AttrValue = serde_json::from_str("\"parquet\"").unwrap();
        assert_eq!(v.as_str(), Some("parquet"));
        let v: AttrValue = serde_json::from_str("[1, \"a\"]").unwrap();
        assert_eq!(v.kind(), "list");
    }

    #[test]
    fn test_to_json() {
        let v = AttrValue::List(vec![AttrValue::Bool(false), AttrValue::from("x")]);
        assert_eq!(v.to_json(), serde_json::json!([false, "x"]));
    }
}
