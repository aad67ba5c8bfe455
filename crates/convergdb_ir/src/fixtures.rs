//! Test-only node type with configurable behaviour.

use convergdb_core::{AttrValue, CoreError, CoreResult};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::rc::Rc;

use crate::node::{Attributes, ChildStructure, IrNode, ResolveScope, StructureScope};
use crate::rules::{validate_string_attributes, ValidationRule};

pub(crate) static FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(parquet|json|csv)$").unwrap());

pub(crate) static FORMAT_RULES: [ValidationRule; 1] = [ValidationRule::required("format", &FORMAT)];

/// Shared record of protocol calls, in call order
#[derive(Debug, Clone, Default)]
pub(crate) struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub(crate) fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Probe {
    label: Option<(String, CallLog)>,
    values: IndexMap<String, AttrValue>,
    strict: bool,
    rules: &'static [ValidationRule],
    inherited: &'static [&'static str],
    resolve_inherited: bool,
    interpolated: &'static [&'static str],
}

impl Probe {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn labeled(label: &str, log: &CallLog) -> Self {
        Self {
            label: Some((label.to_string(), log.clone())),
            ..Self::default()
        }
    }

    pub(crate) fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    /// Unknown attribute names become errors instead of unset values
    pub(crate) fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub(crate) fn with_rules(mut self, rules: &'static [ValidationRule]) -> Self {
        self.rules = rules;
        self
    }

    pub(crate) fn inheriting(mut self, names: &'static [&'static str]) -> Self {
        self.inherited = names;
        self
    }

    /// Copy inherited values into own attributes during resolve
    pub(crate) fn resolving_inherited(mut self) -> Self {
        self.resolve_inherited = true;
        self
    }

    pub(crate) fn interpolating(mut self, names: &'static [&'static str]) -> Self {
        self.interpolated = names;
        self
    }

    pub(crate) fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    fn record(&self, phase: &str) {
        if let Some((label, log)) = &self.label {
            log.push(format!("{phase}:{label}"));
        }
    }
}

impl Attributes for Probe {
    fn kind(&self) -> &'static str {
        "probe"
    }

    fn attribute(&self, name: &str) -> CoreResult<Option<AttrValue>> {
        match self.values.get(name) {
            Some(value) => Ok(Some(value.clone())),
            None if self.strict => Err(CoreError::unknown_attribute(self.kind(), name)),
            None => Ok(None),
        }
    }

    fn set_attribute(&mut self, name: &str, value: Option<AttrValue>) -> CoreResult<()> {
        match value {
            Some(value) => {
                self.values.insert(name.to_string(), value);
            }
            None => {
                self.values.shift_remove(name);
            }
        }
        Ok(())
    }
}

impl IrNode for Probe {
    fn validation_rules(&self) -> &'static [ValidationRule] {
        self.rules
    }

    fn inherits(&self, attribute: &str) -> bool {
        self.inherited.iter().any(|name| *name == attribute)
    }

    fn resolve(&mut self, scope: &ResolveScope<'_>) -> CoreResult<()> {
        self.record("resolve");
        let interpolated = self.interpolated;
        scope.apply_env_vars_to_attributes(self, interpolated)?;
        if self.resolve_inherited {
            let inherited = self.inherited;
            for name in inherited {
                let value = scope.override_parent(&*self, name)?;
                self.set_attribute(name, value)?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> CoreResult<()> {
        self.record("validate");
        validate_string_attributes(self, self.rules)
    }

    fn structure(&self, _scope: &StructureScope<'_>, children: Vec<ChildStructure>) -> CoreResult<Value> {
        let mut map = Map::new();
        for (name, value) in &self.values {
            map.insert(name.clone(), value.to_json());
        }
        if !children.is_empty() {
            map.insert(
                "children".to_string(),
                Value::Array(children.into_iter().map(|c| c.value).collect()),
            );
        }
        Ok(Value::Object(map))
    }
}
