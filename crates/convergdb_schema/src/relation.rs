//! Relation node.
//!
//! A relation lives under a deployment. Region, service role, script bucket,
//! and storage format fall back to the deployment when the relation leaves
//! them unset. The four-part `full_relation_name` is derived from the
//! deployment environment and the relation's own three-part name.

use convergdb_core::{is_present, AttrValue, CoreError, CoreResult};
use convergdb_ir::patterns::{
    AWS_REGION, BOOLEAN_LITERAL, DOTTED_PREFIX, FULL_DOTTED_NAME, ROLE_NAME, SQL_IDENTIFIER,
    THREE_PART_NAME,
};
use convergdb_ir::{Attributes, ChildStructure, IrNode, ResolveScope, StructureScope, ValidationRule};
use serde_json::{Map, Value};

use crate::fields::{into_text, json, json_flag, text};
use crate::patterns::{BUCKET_NAME, STORAGE_FORMAT};

static RULES: [ValidationRule; 9] = [
    ValidationRule::required("relation_name", &THREE_PART_NAME),
    ValidationRule::required("full_relation_name", &FULL_DOTTED_NAME),
    ValidationRule::required("region", &AWS_REGION),
    ValidationRule::required("storage_format", &STORAGE_FORMAT),
    ValidationRule::optional("service_role", &ROLE_NAME),
    ValidationRule::optional("script_bucket", &BUCKET_NAME),
    ValidationRule::optional("source_relation_prefix", &DOTTED_PREFIX),
    ValidationRule::optional("etl_job_name", &SQL_IDENTIFIER),
    ValidationRule::optional("use_inventory", &BOOLEAN_LITERAL).coerced(),
];

const INHERITED: [&str; 4] = ["region", "service_role", "script_bucket", "storage_format"];

const INTERPOLATED: [&str; 7] = [
    "relation_name",
    "source_relation_prefix",
    "etl_job_name",
    "region",
    "service_role",
    "script_bucket",
    "storage_format",
];

/// A relation deployed by the generator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relation {
    /// `domain.schema.relation`
    pub relation_name: Option<String>,
    /// `environment.domain.schema.relation`, derived during resolve
    pub full_relation_name: Option<String>,
    /// AWS region; inherited
    pub region: Option<String>,
    /// Role assumed by the relation's jobs; inherited
    pub service_role: Option<String>,
    /// Bucket for generated scripts; inherited
    pub script_bucket: Option<String>,
    /// Storage format; inherited
    pub storage_format: Option<String>,
    /// Dotted prefix of the upstream relation
    pub source_relation_prefix: Option<String>,
    /// ETL job name; defaults to the full name with `_` separators
    pub etl_job_name: Option<String>,
    /// Whether to use the bucket inventory; boolean or boolean text
    pub use_inventory: Option<AttrValue>,
}

impl Relation {
    /// Create a relation named `domain.schema.relation`
    #[must_use]
    pub fn new(relation_name: impl Into<String>) -> Self {
        Self {
            relation_name: Some(relation_name.into()),
            ..Self::default()
        }
    }

    /// Override the deployment's storage format
    #[must_use]
    pub fn with_storage_format(mut self, format: impl Into<String>) -> Self {
        self.storage_format = Some(format.into());
        self
    }

    /// Override the deployment's region
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    fn derive_full_name(&mut self, scope: &ResolveScope<'_>) -> CoreResult<()> {
        let environment = scope.parent_attribute("environment")?;
        self.full_relation_name = match (environment, &self.relation_name) {
            (Some(AttrValue::Str(env)), Some(name)) => Some(format!("{}.{}", env, name)),
            _ => None,
        };
        if !is_present(text(&self.etl_job_name).as_ref()) {
            self.etl_job_name = self.full_relation_name.as_ref().map(|n| n.replace('.', "_"));
        }
        Ok(())
    }
}

impl Attributes for Relation {
    fn kind(&self) -> &'static str {
        "relation"
    }

    fn attribute(&self, name: &str) -> CoreResult<Option<AttrValue>> {
        let value = match name {
            "relation_name" => text(&self.relation_name),
            "full_relation_name" => text(&self.full_relation_name),
            "region" => text(&self.region),
            "service_role" => text(&self.service_role),
            "script_bucket" => text(&self.script_bucket),
            "storage_format" => text(&self.storage_format),
            "source_relation_prefix" => text(&self.source_relation_prefix),
            "etl_job_name" => text(&self.etl_job_name),
            "use_inventory" => self.use_inventory.clone(),
            _ => return Err(CoreError::unknown_attribute(self.kind(), name)),
        };
        Ok(value)
    }

    fn set_attribute(&mut self, name: &str, value: Option<AttrValue>) -> CoreResult<()> {
        let kind = self.kind();
        let field = match name {
            "relation_name" => &mut self.relation_name,
            "full_relation_name" => &mut self.full_relation_name,
            "region" => &mut self.region,
            "service_role" => &mut self.service_role,
            "script_bucket" => &mut self.script_bucket,
            "storage_format" => &mut self.storage_format,
            "source_relation_prefix" => &mut self.source_relation_prefix,
            "etl_job_name" => &mut self.etl_job_name,
            "use_inventory" => {
                self.use_inventory = value;
                return Ok(());
            }
            _ => return Err(CoreError::unknown_attribute(kind, name)),
        };
        *field = into_text(kind, name, value)?;
        Ok(())
    }
}

impl IrNode for Relation {
    fn validation_rules(&self) -> &'static [ValidationRule] {
        &RULES
    }

    fn inherits(&self, attribute: &str) -> bool {
        INHERITED.iter().any(|name| *name == attribute)
    }

    fn resolve(&mut self, scope: &ResolveScope<'_>) -> CoreResult<()> {
        scope.apply_env_vars_to_attributes(self, &INTERPOLATED)?;
        for name in INHERITED {
            let value = scope.override_parent(&*self, name)?;
            self.set_attribute(name, value)?;
        }
        self.derive_full_name(scope)?;
        tracing::debug!(
            relation = self.full_relation_name.as_deref().unwrap_or("<unnamed>"),
            "relation resolved"
        );
        Ok(())
    }

    fn structure(&self, _scope: &StructureScope<'_>, children: Vec<ChildStructure>) -> CoreResult<Value> {
        let mut map = Map::new();
        map.insert("relation_name".to_string(), json(text(&self.relation_name)));
        map.insert("full_relation_name".to_string(), json(text(&self.full_relation_name)));
        map.insert("region".to_string(), json(text(&self.region)));
        map.insert("service_role".to_string(), json(text(&self.service_role)));
        map.insert("script_bucket".to_string(), json(text(&self.script_bucket)));
        map.insert("storage_format".to_string(), json(text(&self.storage_format)));
        map.insert(
            "source_relation_prefix".to_string(),
            json(text(&self.source_relation_prefix)),
        );
        map.insert("etl_job_name".to_string(), json(text(&self.etl_job_name)));
        map.insert("use_inventory".to_string(), json_flag(&self.use_inventory));
        map.insert(
            "attributes".to_string(),
            Value::Array(children.into_iter().map(|child| child.value).collect()),
        );
        Ok(Value::Object(map))
    }
}
