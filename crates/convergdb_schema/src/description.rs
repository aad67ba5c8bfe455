//! Deployment descriptions and the tree builder.
//!
//! A description is the decoded form of a deployment document. Building
//! walks it in document order, so relations and attributes keep their
//! declared order in the tree and in the generated IR.

use convergdb_core::{AttrValue, CoreResult, NodeId};
use convergdb_ir::{generate, EnvironmentInterpolator, Tree};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attribute::Attribute;
use crate::deployment::Deployment;
use crate::relation::Relation;

/// Top-level deployment document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentDescription {
    /// Deployment environment
    pub environment: Option<String>,
    /// AWS region
    pub region: Option<String>,
    /// Role assumed by generated jobs
    pub service_role: Option<String>,
    /// Bucket for generated scripts
    pub script_bucket: Option<String>,
    /// Default storage format
    pub storage_format: Option<String>,
    /// Relations in declaration order
    #[serde(default)]
    pub relations: Vec<RelationDescription>,
}

/// One relation of a deployment document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationDescription {
    /// `domain.schema.relation`
    pub relation_name: Option<String>,
    /// Region override
    pub region: Option<String>,
    /// Service role override
    pub service_role: Option<String>,
    /// Script bucket override
    pub script_bucket: Option<String>,
    /// Storage format override
    pub storage_format: Option<String>,
    /// Dotted prefix of the upstream relation
    pub source_relation_prefix: Option<String>,
    /// ETL job name
    pub etl_job_name: Option<String>,
    /// Inventory flag
    pub use_inventory: Option<AttrValue>,
    /// Columns in declaration order
    #[serde(default)]
    pub attributes: Vec<AttributeDescription>,
}

/// One column of a relation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeDescription {
    /// Column name
    pub name: Option<String>,
    /// SQL data type
    pub data_type: Option<String>,
    /// Source expression
    pub expression: Option<String>,
    /// `table.column` source
    pub source_field: Option<String>,
    /// NOT NULL flag
    pub required: Option<AttrValue>,
    /// Partition flag
    pub partition: Option<AttrValue>,
}

impl From<&DeploymentDescription> for Deployment {
    fn from(desc: &DeploymentDescription) -> Self {
        Self {
            environment: desc.environment.clone(),
            region: desc.region.clone(),
            service_role: desc.service_role.clone(),
            script_bucket: desc.script_bucket.clone(),
            storage_format: desc.storage_format.clone(),
        }
    }
}

impl From<&RelationDescription> for Relation {
    fn from(desc: &RelationDescription) -> Self {
        Self {
            relation_name: desc.relation_name.clone(),
            full_relation_name: None,
            region: desc.region.clone(),
            service_role: desc.service_role.clone(),
            script_bucket: desc.script_bucket.clone(),
            storage_format: desc.storage_format.clone(),
            source_relation_prefix: desc.source_relation_prefix.clone(),
            etl_job_name: desc.etl_job_name.clone(),
            use_inventory: desc.use_inventory.clone(),
        }
    }
}

impl From<&AttributeDescription> for Attribute {
    fn from(desc: &AttributeDescription) -> Self {
        Self {
            name: desc.name.clone(),
            data_type: desc.data_type.clone(),
            expression: desc.expression.clone(),
            source_field: desc.source_field.clone(),
            required: desc.required.clone(),
            partition: desc.partition.clone(),
        }
    }
}

/// Decode a deployment document
///
/// # Errors
///
/// Returns an invalid-description error if `json` is not a valid document
pub fn parse_description(json: &str) -> CoreResult<DeploymentDescription> {
    Ok(serde_json::from_str(json)?)
}

/// Build an unresolved tree mirroring `desc`
///
/// # Errors
///
/// Returns error if the tree cannot be wired
pub fn build_tree(desc: &DeploymentDescription) -> CoreResult<Tree> {
    let mut tree = Tree::new(Deployment::from(desc));
    for relation in &desc.relations {
        let relation_id = tree.add_child(NodeId::ROOT, Relation::from(relation))?;
        for attribute in &relation.attributes {
            tree.add_child(relation_id, Attribute::from(attribute))?;
        }
    }
    tracing::debug!(
        relations = desc.relations.len(),
        nodes = tree.node_count(),
        "built deployment tree"
    );
    Ok(tree)
}

/// Decode, build, resolve, validate, and structure a deployment document
///
/// # Errors
///
/// Returns the first error from decoding or from any phase
pub fn generate_ir(json: &str, env: &EnvironmentInterpolator) -> CoreResult<Value> {
    let desc = parse_description(json)?;
    generate(build_tree(&desc)?, env)
}
