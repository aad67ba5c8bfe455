//! Core error types for convergdb.

use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// An attribute value failed its declared pattern, type, or mandatory check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{node_kind}: invalid value for {attribute}: {value}")]
pub struct ValidationError {
    /// Type name of the node that owns the attribute
    pub node_kind: String,
    /// Attribute name
    pub attribute: String,
    /// Offending value, rendered for diagnostics (`<absent>` when unset)
    pub value: String,
}

impl ValidationError {
    /// Create a new validation error
    #[must_use]
    pub fn new(node_kind: &str, attribute: &str, value: impl Into<String>) -> Self {
        Self {
            node_kind: node_kind.to_string(),
            attribute: attribute.to_string(),
            value: value.into(),
        }
    }
}

/// Environment references or inheritance lookups that cannot be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// Variable name outside the recognized namespace
    #[error("environment variable {name} must be prefixed with {prefix}")]
    UnprefixedVariable {
        /// Variable name as written in the placeholder
        name: String,
        /// Required namespace prefix
        prefix: String,
    },

    /// Prefixed variable with no bound value
    #[error("environment variable {name} does not exist")]
    MissingVariable {
        /// Variable name
        name: String,
    },

    /// Inheritance lookup on a node with no own value and no parent
    #[error("{node_kind}.{attribute} is unset and the node has no parent to inherit from")]
    MissingParent {
        /// Type name of the node
        node_kind: String,
        /// Attribute being resolved
        attribute: String,
    },
}

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Attribute validation failed
    Validation(ValidationError),

    /// Environment or inheritance configuration failed
    Configuration(ConfigurationError),

    /// Attribute name not known to the node type
    UnknownAttribute {
        /// Type name of the node
        node_kind: String,
        /// Requested attribute
        attribute: String,
    },

    /// Attribute assigned a value of the wrong shape
    TypeMismatch {
        /// Type name of the node
        node_kind: String,
        /// Attribute being written
        attribute: String,
        /// Expected value kind
        expected: String,
    },

    /// Tree wiring is invalid (unknown parent, out-of-order reference)
    InvalidTree {
        /// Reason
        reason: String,
    },

    /// Description could not be decoded
    InvalidDescription {
        /// Decoder message
        message: String,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "Validation failed: {}", err),
            Self::Configuration(err) => write!(f, "Configuration error: {}", err),
            Self::UnknownAttribute {
                node_kind,
                attribute,
            } => write!(f, "Unknown attribute {} on {}", attribute, node_kind),
            Self::TypeMismatch {
                node_kind,
                attribute,
                expected,
            } => write!(
                f,
                "Type mismatch for {}.{}: expected {}",
                node_kind, attribute, expected
            ),
            Self::InvalidTree { reason } => write!(f, "Invalid tree: {}", reason),
            Self::InvalidDescription { message } => {
                write!(f, "Invalid description: {}", message)
            }
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Configuration(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<ConfigurationError> for CoreError {
    fn from(err: ConfigurationError) -> Self {
        Self::Configuration(err)
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidDescription {
            message: err.to_string(),
        }
    }
}

impl CoreError {
    /// Shorthand for an unknown attribute on `node_kind`
    #[must_use]
    pub fn unknown_attribute(node_kind: &str, attribute: &str) -> Self {
        Self::UnknownAttribute {
            node_kind: node_kind.to_string(),
            attribute: attribute.to_string(),
        }
    }

    /// True for errors raised while validating attribute values
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// True for environment and inheritance errors
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
