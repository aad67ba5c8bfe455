//! Attribute (column) node.

use convergdb_core::{AttrValue, CoreError, CoreResult};
use convergdb_ir::patterns::{BOOLEAN_LITERAL, SQL_IDENTIFIER, TWO_PART_NAME_OR_EMPTY};
use convergdb_ir::{Attributes, ChildStructure, IrNode, ResolveScope, StructureScope, ValidationRule};
use serde_json::{Map, Value};

use crate::fields::{into_text, json, json_flag, text};
use crate::patterns::DATA_TYPE;

static RULES: [ValidationRule; 5] = [
    ValidationRule::required("name", &SQL_IDENTIFIER),
    ValidationRule::required("data_type", &DATA_TYPE),
    ValidationRule::optional("source_field", &TWO_PART_NAME_OR_EMPTY),
    ValidationRule::optional("required", &BOOLEAN_LITERAL).coerced(),
    ValidationRule::optional("partition", &BOOLEAN_LITERAL).coerced(),
];

/// A column of a relation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribute {
    /// Column name
    pub name: Option<String>,
    /// SQL data type
    pub data_type: Option<String>,
    /// Expression computing the column from the source record
    pub expression: Option<String>,
    /// `table.column` the value is copied from
    pub source_field: Option<String>,
    /// NOT NULL flag; boolean or boolean text
    pub required: Option<AttrValue>,
    /// Partition column flag; boolean or boolean text
    pub partition: Option<AttrValue>,
}

impl Attribute {
    /// Create a column
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            data_type: Some(data_type.into()),
            ..Self::default()
        }
    }

    /// Set the source expression
    #[must_use]
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    /// Set the required flag
    #[must_use]
    pub fn with_required(mut self, required: impl Into<AttrValue>) -> Self {
        self.required = Some(required.into());
        self
    }
}

impl Attributes for Attribute {
    fn kind(&self) -> &'static str {
        "attribute"
    }

    fn attribute(&self, name: &str) -> CoreResult<Option<AttrValue>> {
        let value = match name {
            "name" => text(&self.name),
            "data_type" => text(&self.data_type),
            "expression" => text(&self.expression),
            "source_field" => text(&self.source_field),
            "required" => self.required.clone(),
            "partition" => self.partition.clone(),
            _ => return Err(CoreError::unknown_attribute(self.kind(), name)),
        };
        Ok(value)
    }

    fn set_attribute(&mut self, name: &str, value: Option<AttrValue>) -> CoreResult<()> {
        let kind = self.kind();
        match name {
            "name" => self.name = into_text(kind, name, value)?,
            "data_type" => self.data_type = into_text(kind, name, value)?,
            "expression" => self.expression = into_text(kind, name, value)?,
            "source_field" => self.source_field = into_text(kind, name, value)?,
            "required" => self.required = value,
            "partition" => self.partition = value,
            _ => return Err(CoreError::unknown_attribute(kind, name)),
        }
        Ok(())
    }
}

impl IrNode for Attribute {
    fn validation_rules(&self) -> &'static [ValidationRule] {
        &RULES
    }

    fn resolve(&mut self, scope: &ResolveScope<'_>) -> CoreResult<()> {
        scope.apply_env_vars_to_attributes(self, &["expression"])
    }

    fn structure(&self, scope: &StructureScope<'_>, _children: Vec<ChildStructure>) -> CoreResult<Value> {
        let relation = match scope.parent() {
            Some(parent) => scope.lineage().attribute_of(parent, "full_relation_name")?,
            None => None,
        };
        let mut map = Map::new();
        map.insert("name".to_string(), json(text(&self.name)));
        map.insert("data_type".to_string(), json(text(&self.data_type)));
        map.insert("expression".to_string(), json(text(&self.expression)));
        map.insert("source_field".to_string(), json(text(&self.source_field)));
        map.insert("required".to_string(), json_flag(&self.required));
        map.insert("partition".to_string(), json_flag(&self.partition));
        map.insert("relation".to_string(), json(relation));
        Ok(Value::Object(map))
    }
}
