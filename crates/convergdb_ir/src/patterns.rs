//! Reusable attribute patterns.
//!
//! Matching is an unanchored search, so every pattern that means "the whole
//! value" carries its own `^` and `$`.

use once_cell::sync::Lazy;
use regex::Regex;

fn compile(pattern: &str) -> Regex {
    // Patterns are string literals in this module; a failure is a bug here.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
}

/// SQL identifier: letters, then up to 127 word characters
pub static SQL_IDENTIFIER: Lazy<Regex> = Lazy::new(|| compile(r"^[a-zA-Z]+\w{0,127}$"));

/// AWS region token such as `us-west-2`
pub static AWS_REGION: Lazy<Regex> = Lazy::new(|| compile(r"^\w+-\w+-\d+$"));

/// Dotted name prefix of one to four segments
pub static DOTTED_PREFIX: Lazy<Regex> = Lazy::new(|| compile(r"^\w+(\.\w+){0,3}$"));

/// Fully qualified dotted name of exactly four segments
pub static FULL_DOTTED_NAME: Lazy<Regex> = Lazy::new(|| compile(r"^\w+\.\w+\.\w+\.\w+$"));

/// Dotted name of exactly three segments
pub static THREE_PART_NAME: Lazy<Regex> = Lazy::new(|| compile(r"^\w+\.\w+\.\w+$"));

/// Dotted name of one to three segments
pub static SHORT_DOTTED_NAME: Lazy<Regex> = Lazy::new(|| compile(r"^\w+(\.\w+){0,2}$"));

/// Free-form role name, or empty
pub static ROLE_NAME: Lazy<Regex> = Lazy::new(|| compile(r"^[\w+=,.@/-]*$"));

/// Boolean literal text, or empty (case-insensitive)
pub static BOOLEAN_LITERAL: Lazy<Regex> = Lazy::new(|| compile(r"(?i)^(t|true|f|false|)$"));

/// Two-segment dotted name, or empty
pub static TWO_PART_NAME_OR_EMPTY: Lazy<Regex> = Lazy::new(|| compile(r"^(\w+\.\w+)?$"));
