//! The IR node contract.
//!
//! Every concrete node type implements [`IrNode`]. The tree drives the
//! recursion; a node only handles its own attributes, reading ancestors
//! through the scope it is handed.

use convergdb_core::{AttrValue, CoreResult, NodeId};
use serde_json::Value;
use std::fmt;

use crate::env::EnvironmentInterpolator;
use crate::inherit::{override_parent, Lineage};
use crate::rules::{validate_string_attributes, ValidationRule};

/// Name-based access to a node's attributes.
///
/// This is the per-type accessor table used by validation, inheritance, and
/// interpolation. Unknown names are errors, not absent values.
pub trait Attributes {
    /// Type name of the node, used in diagnostics
    fn kind(&self) -> &'static str;

    /// Current value of `name`
    ///
    /// # Errors
    ///
    /// Returns an unknown-attribute error if the node has no such attribute
    fn attribute(&self, name: &str) -> CoreResult<Option<AttrValue>>;

    /// Overwrite the value of `name`
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute is unknown or the value has the
    /// wrong shape for it
    fn set_attribute(&mut self, name: &str, value: Option<AttrValue>) -> CoreResult<()>;
}

/// A node of the configuration tree.
pub trait IrNode: Attributes + fmt::Debug {
    /// Static validation table for this node type
    fn validation_rules(&self) -> &'static [ValidationRule] {
        &[]
    }

    /// Whether this node's accessor for `attribute` falls back to its parent
    fn inherits(&self, _attribute: &str) -> bool {
        false
    }

    /// Compute inherited, derived, and interpolated values in place.
    ///
    /// Called once, after every ancestor has been resolved.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when an environment reference or an
    /// inheritance lookup cannot be satisfied
    fn resolve(&mut self, scope: &ResolveScope<'_>) -> CoreResult<()>;

    /// Check own attributes. Must not mutate.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure
    fn validate(&self) -> CoreResult<()> {
        validate_string_attributes(self, self.validation_rules())
    }

    /// Produce this node's output value, embedding the already structured
    /// children (in construction order).
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute lookup fails
    fn structure(&self, scope: &StructureScope<'_>, children: Vec<ChildStructure>) -> CoreResult<Value>;
}

/// Structured output of one child, handed to its parent's `structure`
#[derive(Debug, Clone, PartialEq)]
pub struct ChildStructure {
    /// Child id
    pub id: NodeId,
    /// Child node kind
    pub kind: &'static str,
    /// Child output
    pub value: Value,
}

/// What a node sees while resolving: its ancestors and the environment.
#[derive(Debug)]
pub struct ResolveScope<'a> {
    id: NodeId,
    parent: Option<NodeId>,
    lineage: Lineage<'a>,
    env: &'a EnvironmentInterpolator,
}

impl<'a> ResolveScope<'a> {
    pub(crate) fn new(
        id: NodeId,
        parent: Option<NodeId>,
        lineage: Lineage<'a>,
        env: &'a EnvironmentInterpolator,
    ) -> Self {
        Self {
            id,
            parent,
            lineage,
            env,
        }
    }

    /// Id of the node being resolved
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Id of its parent, `None` at the root
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Read access to the resolved ancestors
    #[must_use]
    pub fn lineage(&self) -> &Lineage<'a> {
        &self.lineage
    }

    /// The environment interpolator for this pass
    #[must_use]
    pub fn env(&self) -> &'a EnvironmentInterpolator {
        self.env
    }

    /// `node`'s own value for `attribute`, else its parent's
    ///
    /// # Errors
    ///
    /// Returns a configuration error at the root when the node has no own
    /// value
    pub fn override_parent<N>(&self, node: &N, attribute: &str) -> CoreResult<Option<AttrValue>>
    where
        N: Attributes + ?Sized,
    {
        override_parent(node, self.parent, &self.lineage, attribute)
    }

    /// The parent's accessor for `attribute`; `None` at the root
    ///
    /// # Errors
    ///
    /// Returns an error if the parent does not expose `attribute`
    pub fn parent_attribute(&self, attribute: &str) -> CoreResult<Option<AttrValue>> {
        match self.parent {
            Some(parent) => self.lineage.attribute_of(parent, attribute),
            None => Ok(None),
        }
    }

    /// Interpolate environment references into the named attributes, in order
    ///
    /// # Errors
    ///
    /// Returns the first configuration error encountered
    pub fn apply_env_vars_to_attributes<N>(&self, node: &mut N, names: &[&str]) -> CoreResult<()>
    where
        N: Attributes + ?Sized,
    {
        self.env.apply_env_vars_to_attributes(node, names)
    }
}

/// What a node sees while structuring: the whole, validated tree.
#[derive(Debug)]
pub struct StructureScope<'a> {
    id: NodeId,
    parent: Option<NodeId>,
    lineage: Lineage<'a>,
}

impl<'a> StructureScope<'a> {
    pub(crate) fn new(id: NodeId, parent: Option<NodeId>, lineage: Lineage<'a>) -> Self {
        Self {
            id,
            parent,
            lineage,
        }
    }

    /// Id of the node being structured
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Id of its parent, `None` at the root
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Read access to the tree
    #[must_use]
    pub fn lineage(&self) -> &Lineage<'a> {
        &self.lineage
    }

    /// `node`'s own value for `attribute`, else its parent's
    ///
    /// # Errors
    ///
    /// Returns a configuration error at the root when the node has no own
    /// value
    pub fn override_parent<N>(&self, node: &N, attribute: &str) -> CoreResult<Option<AttrValue>>
    where
        N: Attributes + ?Sized,
    {
        override_parent(node, self.parent, &self.lineage, attribute)
    }
}
