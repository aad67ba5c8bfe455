//! convergdb IR
//!
//! The protocol every IR node implements (`resolve`, `validate`,
//! `structure`) and the services nodes lean on while running it:
//! string validation tables, environment interpolation, and attribute
//! inheritance from the parent node.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod env;
pub mod inherit;
pub mod node;
pub mod patterns;
pub mod rules;
pub mod tree;

#[cfg(test)]
pub(crate) mod fixtures;

pub use env::{env_vars_in_this_string, EnvPolicy, EnvSource, EnvironmentInterpolator, LayeredEnv, MapEnv, ProcessEnv};
pub use inherit::{override_parent, Lineage};
pub use node::{Attributes, ChildStructure, IrNode, ResolveScope, StructureScope};
pub use rules::{coerced_string_match, valid_string_match, validate_string_attributes, ValidationRule};
pub use tree::{generate, Constructed, Resolved, Tree, Validated};
