//! Attribute inheritance.
//!
//! A node's own value wins; an unset value falls back to the parent's
//! accessor for the same attribute. Only one level is consulted per call.
//! Deeper inheritance happens because the parent's accessor may itself fall
//! back to its own parent.

use convergdb_core::{is_present, AttrValue, ConfigurationError, CoreError, CoreResult, NodeId};

use crate::node::{Attributes, IrNode};
use crate::tree::Slot;

/// Read-only view of the nodes a node may look at: its resolved ancestors
/// during `resolve`, the whole tree afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Lineage<'a> {
    slots: &'a [Slot],
}

impl<'a> Lineage<'a> {
    pub(crate) fn new(slots: &'a [Slot]) -> Self {
        Self { slots }
    }

    fn slot(&self, id: NodeId) -> CoreResult<&'a Slot> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.id == id)
            .ok_or_else(|| CoreError::InvalidTree {
                reason: format!("{} is not visible from here", id),
            })
    }

    /// The node stored under `id`
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not in view
    pub fn node(&self, id: NodeId) -> CoreResult<&'a dyn IrNode> {
        Ok(self.slot(id)?.node.as_ref())
    }

    /// Parent of `id`, `None` at the root
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not in view
    pub fn parent_of(&self, id: NodeId) -> CoreResult<Option<NodeId>> {
        Ok(self.slot(id)?.parent)
    }

    /// The accessor node `id` exposes for `attribute`.
    ///
    /// Own value when set. Otherwise, for attributes the node type inherits,
    /// the parent's accessor.
    ///
    /// # Errors
    ///
    /// Returns an error if a visited node does not expose `attribute`
    pub fn attribute_of(&self, id: NodeId, attribute: &str) -> CoreResult<Option<AttrValue>> {
        let slot = self.slot(id)?;
        let own = slot.node.attribute(attribute)?;
        if is_present(own.as_ref()) || !slot.node.inherits(attribute) {
            return Ok(own);
        }
        match slot.parent {
            Some(parent) => self.attribute_of(parent, attribute),
            None => Ok(own),
        }
    }
}

/// `node`'s own value for `attribute` if set, else `parent`'s accessor.
///
/// # Errors
///
/// Returns [`ConfigurationError::MissingParent`] when the node has no own
/// value and no parent.
pub fn override_parent<N>(
    node: &N,
    parent: Option<NodeId>,
    lineage: &Lineage<'_>,
    attribute: &str,
) -> CoreResult<Option<AttrValue>>
where
    N: Attributes + ?Sized,
{
    let own = node.attribute(attribute)?;
    if is_present(own.as_ref()) {
        return Ok(own);
    }
    let parent = parent.ok_or_else(|| ConfigurationError::MissingParent {
        node_kind: node.kind().to_string(),
        attribute: attribute.to_string(),
    })?;
    lineage.attribute_of(parent, attribute)
}
