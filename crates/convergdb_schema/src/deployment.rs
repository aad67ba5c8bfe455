//! Deployment root node.
//!
//! Holds the settings every relation in the deployment inherits unless it
//! overrides them.

use convergdb_core::{AttrValue, CoreError, CoreResult};
use convergdb_ir::patterns::{AWS_REGION, ROLE_NAME, SQL_IDENTIFIER};
use convergdb_ir::{Attributes, ChildStructure, IrNode, ResolveScope, StructureScope, ValidationRule};
use serde_json::{Map, Value};

use crate::fields::{into_text, json, text};
use crate::patterns::{BUCKET_NAME, STORAGE_FORMAT};

static RULES: [ValidationRule; 5] = [
    ValidationRule::required("environment", &SQL_IDENTIFIER),
    ValidationRule::required("region", &AWS_REGION),
    ValidationRule::optional("service_role", &ROLE_NAME),
    ValidationRule::optional("script_bucket", &BUCKET_NAME),
    ValidationRule::optional("storage_format", &STORAGE_FORMAT),
];

/// Attributes that may carry `${env.NAME}` references, in interpolation order
const INTERPOLATED: [&str; 5] = [
    "environment",
    "region",
    "service_role",
    "script_bucket",
    "storage_format",
];

/// Root of a deployment tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deployment {
    /// Deployment environment (`prod`, `staging`, ...)
    pub environment: Option<String>,
    /// AWS region
    pub region: Option<String>,
    /// Role assumed by generated jobs
    pub service_role: Option<String>,
    /// Bucket for generated scripts
    pub script_bucket: Option<String>,
    /// Default storage format for relations
    pub storage_format: Option<String>,
}

impl Deployment {
    /// Create a deployment for `environment`
    #[must_use]
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: Some(environment.into()),
            ..Self::default()
        }
    }

    /// Set the region
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the service role
    #[must_use]
    pub fn with_service_role(mut self, role: impl Into<String>) -> Self {
        self.service_role = Some(role.into());
        self
    }

    /// Set the script bucket
    #[must_use]
    pub fn with_script_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.script_bucket = Some(bucket.into());
        self
    }

    /// Set the default storage format
    #[must_use]
    pub fn with_storage_format(mut self, format: impl Into<String>) -> Self {
        self.storage_format = Some(format.into());
        self
    }
}

impl Attributes for Deployment {
    fn kind(&self) -> &'static str {
        "deployment"
    }

    fn attribute(&self, name: &str) -> CoreResult<Option<AttrValue>> {
        let value = match name {
            "environment" => text(&self.environment),
            "region" => text(&self.region),
            "service_role" => text(&self.service_role),
            "script_bucket" => text(&self.script_bucket),
            "storage_format" => text(&self.storage_format),
            _ => return Err(CoreError::unknown_attribute(self.kind(), name)),
        };
        Ok(value)
    }

    fn set_attribute(&mut self, name: &str, value: Option<AttrValue>) -> CoreResult<()> {
        let kind = self.kind();
        let field = match name {
            "environment" => &mut self.environment,
            "region" => &mut self.region,
            "service_role" => &mut self.service_role,
            "script_bucket" => &mut self.script_bucket,
            "storage_format" => &mut self.storage_format,
            _ => return Err(CoreError::unknown_attribute(kind, name)),
        };
        *field = into_text(kind, name, value)?;
        Ok(())
    }
}

impl IrNode for Deployment {
    fn validation_rules(&self) -> &'static [ValidationRule] {
        &RULES
    }

    fn resolve(&mut self, scope: &ResolveScope<'_>) -> CoreResult<()> {
        scope.apply_env_vars_to_attributes(self, &INTERPOLATED)
    }

    fn structure(&self, _scope: &StructureScope<'_>, children: Vec<ChildStructure>) -> CoreResult<Value> {
        let mut map = Map::new();
        map.insert("environment".to_string(), json(text(&self.environment)));
        map.insert("region".to_string(), json(text(&self.region)));
        map.insert("service_role".to_string(), json(text(&self.service_role)));
        map.insert("script_bucket".to_string(), json(text(&self.script_bucket)));
        map.insert("storage_format".to_string(), json(text(&self.storage_format)));
        map.insert(
            "relations".to_string(),
            Value::Array(children.into_iter().map(|child| child.value).collect()),
        );
        Ok(Value::Object(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convergdb_ir::{EnvPolicy, EnvironmentInterpolator, MapEnv, Tree};

    fn env() -> EnvironmentInterpolator {
        EnvironmentInterpolator::new(
            EnvPolicy::new(),
            MapEnv::new()
                .with("CONVERGDB_ENV", "prod")
                .with("CONVERGDB_REGION", "us-west-2"),
        )
    }

    #[test]
    fn test_attribute_access() {
        let mut node = Deployment::new("prod").with_region("us-east-1");
        assert_eq!(node.attribute("region").unwrap(), Some(AttrValue::from("us-east-1")));
        node.set_attribute("region", None).unwrap();
        assert_eq!(node.region, None);
        assert!(node.attribute("nope").is_err());
        assert!(node.set_attribute("environment", Some(AttrValue::Bool(true))).is_err());
    }

    #[test]
    fn test_resolve_interpolates() {
        let tree = Tree::new(
            Deployment::new("${env.CONVERGDB_ENV}").with_region("${env.CONVERGDB_REGION}"),
        );
        let tree = tree.resolve(&env()).unwrap();
        let root = tree.node(tree.root()).unwrap();
        assert_eq!(root.attribute("environment").unwrap(), Some(AttrValue::from("prod")));
        assert_eq!(root.attribute("region").unwrap(), Some(AttrValue::from("us-west-2")));
    }

    #[test]
    fn test_validate_requires_region() {
        let tree = Tree::new(Deployment::new("prod")).resolve(&env()).unwrap();
        let err = tree.validate().unwrap_err();
        match err {
            CoreError::Validation(e) => {
                assert_eq!(e.node_kind, "deployment");
                assert_eq!(e.attribute, "region");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_structure_without_relations() {
        let tree = Tree::new(Deployment::new("prod").with_region("us-west-2"))
            .resolve(&env())
            .unwrap()
            .validate()
            .unwrap();
        let value = tree.structure().unwrap();
        assert_eq!(value["environment"], "prod");
        assert_eq!(value["service_role"], Value::Null);
        assert_eq!(value["relations"], serde_json::json!([]));
    }
}
