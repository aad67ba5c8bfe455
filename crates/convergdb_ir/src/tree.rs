//! Arena-backed IR tree and the three-phase protocol.
//!
//! The tree owns every node. Nodes refer to each other by [`NodeId`] only,
//! and a parent is always inserted before its children, so a node's
//! ancestors all sit at lower arena indices.
//!
//! The phase is part of the type:
//!
//! ```text
//! Tree<Constructed> --resolve--> Tree<Resolved> --validate--> Tree<Validated> --structure--> Value
//! ```
//!
//! Resolving twice, or structuring an unvalidated tree, does not compile.

use convergdb_core::{AttrValue, CoreError, CoreResult, NodeId};
use serde_json::Value;
use std::marker::PhantomData;

use crate::env::EnvironmentInterpolator;
use crate::inherit::Lineage;
use crate::node::{ChildStructure, IrNode, ResolveScope, StructureScope};

mod sealed {
    pub trait Sealed {}
}

/// Marker for a tree lifecycle phase
pub trait Phase: sealed::Sealed {}

/// Built, not yet resolved
#[derive(Debug, Clone, Copy)]
pub struct Constructed;

/// Every node resolved
#[derive(Debug, Clone, Copy)]
pub struct Resolved;

/// Every node validated; ready to structure
#[derive(Debug, Clone, Copy)]
pub struct Validated;

impl sealed::Sealed for Constructed {}
impl sealed::Sealed for Resolved {}
impl sealed::Sealed for Validated {}
impl Phase for Constructed {}
impl Phase for Resolved {}
impl Phase for Validated {}

/// One arena entry
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node: Box<dyn IrNode>,
}

/// A tree of IR nodes in lifecycle phase `P`
#[derive(Debug)]
pub struct Tree<P: Phase = Constructed> {
    slots: Vec<Slot>,
    phase: PhantomData<P>,
}

impl<P: Phase> Tree<P> {
    /// Id of the root node
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Total node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.slots.len()
    }

    /// Get node by id
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&dyn IrNode> {
        self.slots.get(id.index()).map(|slot| slot.node.as_ref())
    }

    /// Parent of `id`, `None` at the root or for unknown ids
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots.get(id.index()).and_then(|slot| slot.parent)
    }

    /// Children of `id` in construction order
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slots
            .get(id.index())
            .map_or(&[][..], |slot| slot.children.as_slice())
    }

    /// Read-only view over every node
    #[must_use]
    pub fn lineage(&self) -> Lineage<'_> {
        Lineage::new(&self.slots)
    }

    /// Inheritance-aware accessor for `attribute` on node `id`
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown or a visited node does not expose
    /// `attribute`
    pub fn attribute_of(&self, id: NodeId, attribute: &str) -> CoreResult<Option<AttrValue>> {
        self.lineage().attribute_of(id, attribute)
    }

    /// Ids in depth-first pre-order, children in construction order
    #[must_use]
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.slots.len());
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    fn into_phase<Q: Phase>(self) -> Tree<Q> {
        Tree {
            slots: self.slots,
            phase: PhantomData,
        }
    }
}

impl Tree<Constructed> {
    /// Create a tree holding only `root`
    #[must_use]
    pub fn new(root: impl IrNode + 'static) -> Self {
        Self {
            slots: vec![Slot {
                id: NodeId::ROOT,
                parent: None,
                children: Vec::new(),
                node: Box::new(root),
            }],
            phase: PhantomData,
        }
    }

    /// Append `node` as the last child of `parent`
    ///
    /// # Errors
    ///
    /// Returns error if `parent` is not in the tree
    pub fn add_child(&mut self, parent: NodeId, node: impl IrNode + 'static) -> CoreResult<NodeId> {
        self.add_boxed(parent, Box::new(node))
    }

    /// Append an already boxed node as the last child of `parent`
    ///
    /// # Errors
    ///
    /// Returns error if `parent` is not in the tree or the arena is full
    pub fn add_boxed(&mut self, parent: NodeId, node: Box<dyn IrNode>) -> CoreResult<NodeId> {
        if parent.index() >= self.slots.len() {
            return Err(CoreError::InvalidTree {
                reason: format!("parent {} does not exist", parent),
            });
        }
        let index = u32::try_from(self.slots.len()).map_err(|_| CoreError::InvalidTree {
            reason: "too many nodes".to_string(),
        })?;
        let id = NodeId::from_index(index);
        self.slots.push(Slot {
            id,
            parent: Some(parent),
            children: Vec::new(),
            node,
        });
        self.slots[parent.index()].children.push(id);
        Ok(id)
    }

    /// Resolve every node, parents before children.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a node; nothing after it is resolved
    pub fn resolve(mut self, env: &EnvironmentInterpolator) -> CoreResult<Tree<Resolved>> {
        for id in self.preorder() {
            // ancestors occupy lower indices than the node itself
            let (ancestors, rest) = self.slots.split_at_mut(id.index());
            let slot = &mut rest[0];
            let scope = ResolveScope::new(slot.id, slot.parent, Lineage::new(ancestors), env);
            tracing::debug!(node = %slot.id, kind = slot.node.kind(), "resolving");
            slot.node.resolve(&scope)?;
        }
        tracing::info!(nodes = self.slots.len(), "tree resolved");
        Ok(self.into_phase())
    }
}

impl Tree<Resolved> {
    /// Validate every node in pre-order; the first failure aborts the pass.
    ///
    /// # Errors
    ///
    /// Returns the first validation error in traversal order
    pub fn validate(self) -> CoreResult<Tree<Validated>> {
        for id in self.preorder() {
            let slot = &self.slots[id.index()];
            tracing::debug!(node = %slot.id, kind = slot.node.kind(), "validating");
            slot.node.validate()?;
        }
        tracing::info!(nodes = self.slots.len(), "tree validated");
        Ok(self.into_phase())
    }
}

impl Tree<Validated> {
    /// Nested, order-preserving output value for the whole tree.
    ///
    /// Pure; repeated calls return equal values.
    ///
    /// # Errors
    ///
    /// Returns an error if a node's structuring lookup fails
    pub fn structure(&self) -> CoreResult<Value> {
        self.structure_of(NodeId::ROOT)
    }

    /// Output value for the subtree rooted at `id`
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown or a structuring lookup fails
    pub fn structure_of(&self, id: NodeId) -> CoreResult<Value> {
        let slot = self.slots.get(id.index()).ok_or_else(|| CoreError::InvalidTree {
            reason: format!("{} does not exist", id),
        })?;
        let children = slot
            .children
            .iter()
            .map(|&child| {
                Ok(ChildStructure {
                    id: child,
                    kind: self.slots[child.index()].node.kind(),
                    value: self.structure_of(child)?,
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;
        let scope = StructureScope::new(slot.id, slot.parent, self.lineage());
        slot.node.structure(&scope, children)
    }
}

/// Run all three phases on `tree` and return the root's structure.
///
/// # Errors
///
/// Returns the first error from any phase
pub fn generate(tree: Tree<Constructed>, env: &EnvironmentInterpolator) -> CoreResult<Value> {
    tree.resolve(env)?.validate()?.structure()
}
