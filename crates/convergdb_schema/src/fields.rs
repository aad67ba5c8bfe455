//! Conversions between typed node fields and attribute values.

use convergdb_core::{AttrValue, CoreError, CoreResult};
use serde_json::Value;

/// Attribute view of a text field
pub(crate) fn text(field: &Option<String>) -> Option<AttrValue> {
    field.as_ref().map(|s| AttrValue::Str(s.clone()))
}

/// Text field from an attribute value; anything but a string is rejected
pub(crate) fn into_text(
    kind: &str,
    attribute: &str,
    value: Option<AttrValue>,
) -> CoreResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(AttrValue::Str(s)) => Ok(Some(s)),
        Some(_) => Err(CoreError::TypeMismatch {
            node_kind: kind.to_string(),
            attribute: attribute.to_string(),
            expected: "string".to_string(),
        }),
    }
}

/// JSON view of an optional attribute, `null` when unset
pub(crate) fn json(value: Option<AttrValue>) -> Value {
    value.map_or(Value::Null, |v| v.to_json())
}

/// JSON view of a flag that may be written as a boolean or as text
pub(crate) fn json_flag(value: &Option<AttrValue>) -> Value {
    match value {
        None => Value::Null,
        Some(AttrValue::Bool(b)) => Value::Bool(*b),
        Some(other) => {
            let text = other.to_string().to_ascii_lowercase();
            match text.as_str() {
                "t" | "true" => Value::Bool(true),
                "f" | "false" => Value::Bool(false),
                _ => Value::Null,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_text_rejects_non_strings() {
        let err = into_text("relation", "region", Some(AttrValue::Int(1))).unwrap_err();
        assert!(matches!(err, CoreError::TypeMismatch { .. }));
        assert_eq!(into_text("relation", "region", None).unwrap(), None);
    }

    #[test]
    fn test_json_flag() {
        assert_eq!(json_flag(&Some(AttrValue::from("T"))), Value::Bool(true));
        assert_eq!(json_flag(&Some(AttrValue::from("false"))), Value::Bool(false));
        assert_eq!(json_flag(&Some(AttrValue::Bool(true))), Value::Bool(true));
        assert_eq!(json_flag(&Some(AttrValue::from(""))), Value::Null);
        assert_eq!(json_flag(&None), Value::Null);
    }
}
