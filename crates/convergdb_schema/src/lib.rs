//! convergdb Schema Nodes
//!
//! Concrete IR node types for a deployment description and the builder that
//! turns a decoded description into a [`convergdb_ir::Tree`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attribute;
pub mod deployment;
pub mod description;
mod fields;
pub mod patterns;
pub mod relation;

pub use attribute::Attribute;
pub use deployment::Deployment;
pub use description::{
    build_tree, generate_ir, parse_description, AttributeDescription, DeploymentDescription,
    RelationDescription,
};
pub use relation::Relation;
