//! Declarative string validation tables.
//!
//! Each node type declares one static table of [`ValidationRule`]s. The
//! executor walks the table in order and stops at the first failure.

use convergdb_core::{AttrValue, CoreResult, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::node::Attributes;

/// One entry of a node type's validation table
#[derive(Debug, Clone, Copy)]
pub struct ValidationRule {
    /// Attribute the rule applies to
    pub attribute: &'static str,
    /// Pattern the value must contain a match for
    pub pattern: &'static Lazy<Regex>,
    /// Whether absence is a failure
    pub mandatory: bool,
    /// Stringify non-string values before matching instead of rejecting them
    pub coerce: bool,
}

impl ValidationRule {
    /// Rule for an attribute that must be set
    #[must_use]
    pub const fn required(attribute: &'static str, pattern: &'static Lazy<Regex>) -> Self {
        Self {
            attribute,
            pattern,
            mandatory: true,
            coerce: false,
        }
    }

    /// Rule for an attribute that may be left unset
    #[must_use]
    pub const fn optional(attribute: &'static str, pattern: &'static Lazy<Regex>) -> Self {
        Self {
            attribute,
            pattern,
            mandatory: false,
            coerce: false,
        }
    }

    /// Match the text form of non-string values (booleans, integers)
    #[must_use]
    pub const fn coerced(mut self) -> Self {
        self.coerce = true;
        self
    }

    /// Check a candidate value against this rule
    #[must_use]
    pub fn check(&self, value: Option<&AttrValue>) -> bool {
        if self.coerce {
            coerced_string_match(value, self.pattern, self.mandatory)
        } else {
            valid_string_match(value, self.pattern, self.mandatory)
        }
    }
}

/// Strict matching: the value must be a string containing a match.
///
/// An unset value passes only when the rule is optional.
#[must_use]
pub fn valid_string_match(value: Option<&AttrValue>, pattern: &Regex, mandatory: bool) -> bool {
    match value {
        None => !mandatory,
        Some(AttrValue::Str(s)) => pattern.is_match(s),
        Some(_) => false,
    }
}

/// Coercing matching: non-string values are matched by their text form.
#[must_use]
pub fn coerced_string_match(value: Option<&AttrValue>, pattern: &Regex, mandatory: bool) -> bool {
    match value {
        None => !mandatory,
        Some(AttrValue::Str(s)) => pattern.is_match(s),
        Some(other) => pattern.is_match(&other.to_string()),
    }
}

/// Run a validation table against a node, failing on the first bad entry.
///
/// # Errors
///
/// Returns a validation error naming the node kind, attribute, and value of
/// the first entry that does not match, or an unknown-attribute error if the
/// table names an attribute the node does not expose.
pub fn validate_string_attributes<N>(node: &N, rules: &[ValidationRule]) -> CoreResult<()>
where
    N: Attributes + ?Sized,
{
    for rule in rules {
        let value = node.attribute(rule.attribute)?;
        if !rule.check(value.as_ref()) {
            let rendered = value
                .as_ref()
                .map_or_else(|| "<absent>".to_string(), |v| format!("{:?}", v.to_string()));
            tracing::debug!(
                node = node.kind(),
                attribute = rule.attribute,
                "attribute failed validation"
            );
            return Err(ValidationError::new(node.kind(), rule.attribute, rendered).into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Probe;
    use crate::patterns::{BOOLEAN_LITERAL, SQL_IDENTIFIER};
    use convergdb_core::CoreError;
    use proptest::prelude::*;

    static NAME_RULES: [ValidationRule; 2] = [
        ValidationRule::required("name", &SQL_IDENTIFIER),
        ValidationRule::optional("flag", &BOOLEAN_LITERAL).coerced(),
    ];

    #[test]
    fn test_optional_absent_passes() {
        assert!(valid_string_match(None, &SQL_IDENTIFIER, false));
        assert!(coerced_string_match(None, &SQL_IDENTIFIER, false));
    }

    #[test]
    fn test_mandatory_absent_fails() {
        assert!(!valid_string_match(None, &SQL_IDENTIFIER, true));
        assert!(!coerced_string_match(None, &SQL_IDENTIFIER, true));
    }

    #[test]
    fn test_non_string_rejected_before_pattern() {
        let v = AttrValue::Bool(true);
        assert!(!valid_string_match(Some(&v), &BOOLEAN_LITERAL, false));
        assert!(coerced_string_match(Some(&v), &BOOLEAN_LITERAL, false));
    }

    #[test]
    fn test_coerced_rejects_non_matching_text() {
        let v = AttrValue::Int(7);
        assert!(!coerced_string_match(Some(&v), &BOOLEAN_LITERAL, true));
    }

    #[test]
    fn test_partial_match_is_accepted() {
        let unanchored = Regex::new("abc").unwrap();
        let v = AttrValue::from("xxabcxx");
        assert!(valid_string_match(Some(&v), &unanchored, true));
    }

    #[test]
    fn test_empty_string_is_present() {
        let v = AttrValue::from("");
        assert!(!valid_string_match(Some(&v), &SQL_IDENTIFIER, false));
        assert!(valid_string_match(Some(&v), &BOOLEAN_LITERAL, true));
    }

    #[test]
    fn test_validate_string_attributes_passes() {
        let probe = Probe::new().with("name", "orders").with("flag", true);
        assert!(validate_string_attributes(&probe, &NAME_RULES).is_ok());
    }

    #[test]
    fn test_validate_string_attributes_reports_first_failure() {
        let probe = Probe::new().with("name", "1orders").with("flag", "maybe");
        let err = validate_string_attributes(&probe, &NAME_RULES).unwrap_err();
        match err {
            CoreError::Validation(e) => {
                assert_eq!(e.node_kind, "probe");
                assert_eq!(e.attribute, "name");
                assert_eq!(e.value, "\"1orders\"");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_string_attributes_mandatory_absent() {
        let probe = Probe::new();
        let err = validate_string_attributes(&probe, &NAME_RULES).unwrap_err();
        match err {
            CoreError::Validation(e) => assert_eq!(e.value, "<absent>"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_string_attributes_unknown_attribute() {
        static BAD: [ValidationRule; 1] = [ValidationRule::optional("missing", &SQL_IDENTIFIER)];
        let probe = Probe::new().strict();
        let err = validate_string_attributes(&probe, &BAD).unwrap_err();
        assert!(matches!(err, CoreError::UnknownAttribute { .. }));
    }

    proptest! {
        #[test]
        fn prop_coerced_accepts_every_bool(b: bool) {
            let v = AttrValue::Bool(b);
            prop_assert!(coerced_string_match(Some(&v), &BOOLEAN_LITERAL, true));
            prop_assert!(!valid_string_match(Some(&v), &BOOLEAN_LITERAL, true));
        }

        #[test]
        fn prop_strict_and_coerced_agree_on_strings(s in "[a-z0-9_ .-]{0,20}") {
            let v = AttrValue::Str(s);
            prop_assert_eq!(
                valid_string_match(Some(&v), &SQL_IDENTIFIER, true),
                coerced_string_match(Some(&v), &SQL_IDENTIFIER, true)
            );
        }
    }
}
