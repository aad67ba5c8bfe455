//! Environment variable interpolation.
//!
//! String attributes may embed `${env.NAME}` placeholders. Every distinct
//! placeholder is resolved once and substituted everywhere it occurs. Names
//! outside the configured namespace, and names with no bound value, are
//! configuration errors; a placeholder is never left in place.

use convergdb_core::{AttrValue, ConfigurationError, CoreResult};
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ffi::OsString;
use std::fmt;

use crate::node::Attributes;

/// Placeholder syntax
static ENV_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{env\.\w+\}").unwrap_or_else(|e| panic!("invalid placeholder pattern: {e}"))
});

const PLACEHOLDER_PREFIX: &str = "${env.";
const PLACEHOLDER_SUFFIX: &str = "}";

/// Default namespace for variables this system may read
pub const DEFAULT_PREFIX: &str = "CONVERGDB_";

/// Distinct placeholders in `s`, in order of first appearance.
#[must_use]
pub fn env_vars_in_this_string(s: Option<&str>) -> Vec<String> {
    let Some(s) = s else {
        return Vec::new();
    };
    ENV_REFERENCE
        .find_iter(s)
        .map(|m| m.as_str().to_string())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

fn variable_name(placeholder: &str) -> &str {
    placeholder
        .strip_prefix(PLACEHOLDER_PREFIX)
        .and_then(|rest| rest.strip_suffix(PLACEHOLDER_SUFFIX))
        .unwrap_or(placeholder)
}

/// Naming convention a variable must satisfy to be resolvable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvPolicy {
    prefix: String,
}

impl EnvPolicy {
    /// Policy with the default `CONVERGDB_` namespace
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Set the required namespace prefix
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Required namespace prefix
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether `name` belongs to the namespace
    #[must_use]
    pub fn permits(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }
}

impl Default for EnvPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Where variable values come from
pub trait EnvSource: fmt::Debug {
    /// Value bound to `name`, if any
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// An explicit set of variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnv {
    vars: IndexMap<String, String>,
}

impl MapEnv {
    /// Create an empty environment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    #[must_use]
    pub fn from_process() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    fn from_os_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        vars.into_iter()
            .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => Some((name, value)),
                (name, _) => {
                    tracing::debug!(name = ?name.as_deref().ok(), "skipping non UTF-8 variable");
                    None
                }
            })
            .collect()
    }

    /// Bind `name` to `value`, replacing any previous binding
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Number of bound variables
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// True if nothing is bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl FromIterator<(String, String)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Explicit bindings in front of another source.
///
/// Lookups try the bindings first and fall through to the base source, so
/// the base is never enumerated.
#[derive(Debug)]
pub struct LayeredEnv {
    overrides: MapEnv,
    base: Box<dyn EnvSource>,
}

impl LayeredEnv {
    /// Layer `overrides` over `base`
    #[must_use]
    pub fn new(overrides: MapEnv, base: impl EnvSource + 'static) -> Self {
        Self {
            overrides,
            base: Box::new(base),
        }
    }
}

impl EnvSource for LayeredEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.overrides.var(name).or_else(|| self.base.var(name))
    }
}

/// Resolves `${env.NAME}` placeholders against an [`EnvSource`]
#[derive(Debug)]
pub struct EnvironmentInterpolator {
    policy: EnvPolicy,
    source: Box<dyn EnvSource>,
}

impl EnvironmentInterpolator {
    /// Create an interpolator over `source`
    #[must_use]
    pub fn new(policy: EnvPolicy, source: impl EnvSource + 'static) -> Self {
        Self {
            policy,
            source: Box::new(source),
        }
    }

    /// Interpolator over the process environment with the default policy
    #[must_use]
    pub fn from_process() -> Self {
        Self::new(EnvPolicy::new(), ProcessEnv)
    }

    /// The naming policy in force
    #[must_use]
    pub fn policy(&self) -> &EnvPolicy {
        &self.policy
    }

    /// Value of variable `name`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `name` is outside the namespace
    /// (whether or not it is bound) or is not bound
    pub fn resolve_var(&self, name: &str) -> CoreResult<String> {
        if !self.policy.permits(name) {
            return Err(ConfigurationError::UnprefixedVariable {
                name: name.to_string(),
                prefix: self.policy.prefix().to_string(),
            }
            .into());
        }
        self.source.var(name).ok_or_else(|| {
            ConfigurationError::MissingVariable {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// `s` with every placeholder substituted; `None` stays `None`
    ///
    /// # Errors
    ///
    /// Returns the configuration error of the first unresolvable placeholder
    pub fn apply_env_vars(&self, s: Option<&str>) -> CoreResult<Option<String>> {
        let Some(s) = s else {
            return Ok(None);
        };
        let mut out = s.to_string();
        for placeholder in env_vars_in_this_string(Some(s)) {
            let name = variable_name(&placeholder);
            let value = self.resolve_var(name)?;
            tracing::trace!(variable = name, "substituting environment variable");
            out = out.replace(&placeholder, &value);
        }
        Ok(Some(out))
    }

    /// Interpolate each named string attribute of `node` in the given order
    ///
    /// Unset and non-string attributes are left untouched.
    ///
    /// # Errors
    ///
    /// Returns the first configuration or attribute access error
    pub fn apply_env_vars_to_attributes<N>(&self, node: &mut N, names: &[&str]) -> CoreResult<()>
    where
        N: Attributes + ?Sized,
    {
        for name in names {
            if let Some(AttrValue::Str(raw)) = node.attribute(name)? {
                let resolved = self.apply_env_vars(Some(&raw))?;
                node.set_attribute(name, resolved.map(AttrValue::Str))?;
            }
        }
        Ok(())
    }
}

impl Default for EnvironmentInterpolator {
    fn default() -> Self {
        Self::from_process()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Probe;
    use convergdb_core::CoreError;
    use proptest::prelude::*;

    fn interpolator(env: MapEnv) -> EnvironmentInterpolator {
        EnvironmentInterpolator::new(EnvPolicy::new(), env)
    }

    #[test]
    fn test_env_vars_in_this_string_dedupes() {
        let found = env_vars_in_this_string(Some("${env.CONVERGDB_A} and ${env.CONVERGDB_A}"));
        assert_eq!(found, vec!["${env.CONVERGDB_A}".to_string()]);
    }

    #[test]
    fn test_env_vars_in_this_string_keeps_order() {
        let found = env_vars_in_this_string(Some("${env.CONVERGDB_B}/${env.CONVERGDB_A}/${env.CONVERGDB_B}"));
        assert_eq!(found, vec!["${env.CONVERGDB_B}", "${env.CONVERGDB_A}"]);
    }

    #[test]
    fn test_env_vars_in_empty_or_absent_string() {
        assert!(env_vars_in_this_string(None).is_empty());
        assert!(env_vars_in_this_string(Some("")).is_empty());
        assert!(env_vars_in_this_string(Some("no placeholders")).is_empty());
    }

    #[test]
    fn test_apply_env_vars_replaces_all_occurrences() {
        let interp = interpolator(MapEnv::new().with("CONVERGDB_A", "foo"));
        let out = interp
            .apply_env_vars(Some("${env.CONVERGDB_A} and ${env.CONVERGDB_A}"))
            .unwrap();
        assert_eq!(out.as_deref(), Some("foo and foo"));
    }

    #[test]
    fn test_apply_env_vars_multiple_distinct() {
        let interp = interpolator(
            MapEnv::new()
                .with("CONVERGDB_BUCKET", "artifacts")
                .with("CONVERGDB_ENV", "prod"),
        );
        let out = interp
            .apply_env_vars(Some("s3://${env.CONVERGDB_BUCKET}/${env.CONVERGDB_ENV}/"))
            .unwrap();
        assert_eq!(out.as_deref(), Some("s3://artifacts/prod/"));
    }

    #[test]
    fn test_apply_env_vars_absent_is_absent() {
        let interp = interpolator(MapEnv::new());
        assert_eq!(interp.apply_env_vars(None).unwrap(), None);
    }

    #[test]
    fn test_unprefixed_name_fails_even_when_bound() {
        let interp = interpolator(MapEnv::new().with("OTHER", "bound"));
        let err = interp.apply_env_vars(Some("${env.OTHER}")).unwrap_err();
        assert_eq!(
            err,
            CoreError::Configuration(ConfigurationError::UnprefixedVariable {
                name: "OTHER".to_string(),
                prefix: "CONVERGDB_".to_string(),
            })
        );
    }

    #[test]
    fn test_unbound_prefixed_name_fails() {
        let interp = interpolator(MapEnv::new());
        let err = interp.apply_env_vars(Some("x${env.CONVERGDB_NOPE}")).unwrap_err();
        assert_eq!(
            err,
            CoreError::Configuration(ConfigurationError::MissingVariable {
                name: "CONVERGDB_NOPE".to_string(),
            })
        );
    }

    #[test]
    fn test_custom_prefix_policy() {
        let interp = EnvironmentInterpolator::new(
            EnvPolicy::new().with_prefix("ACME_"),
            MapEnv::new().with("ACME_X", "1").with("CONVERGDB_X", "2"),
        );
        assert_eq!(interp.apply_env_vars(Some("${env.ACME_X}")).unwrap().as_deref(), Some("1"));
        assert!(interp.apply_env_vars(Some("${env.CONVERGDB_X}")).is_err());
    }

    #[test]
    fn test_process_env_source() {
        let interp = EnvironmentInterpolator::new(EnvPolicy::new().with_prefix("CARGO_"), ProcessEnv);
        let out = interp.apply_env_vars(Some("${env.CARGO_PKG_NAME}")).unwrap();
        assert_eq!(out.as_deref(), Some(env!("CARGO_PKG_NAME")));
    }

    #[test]
    fn test_layered_env_prefers_overrides() {
        let env = LayeredEnv::new(
            MapEnv::new().with("CONVERGDB_ENV", "staging"),
            MapEnv::new()
                .with("CONVERGDB_ENV", "prod")
                .with("CONVERGDB_REGION", "us-west-2"),
        );
        assert_eq!(env.var("CONVERGDB_ENV").as_deref(), Some("staging"));
        assert_eq!(env.var("CONVERGDB_REGION").as_deref(), Some("us-west-2"));
        assert_eq!(env.var("CONVERGDB_MISSING"), None);
    }

    #[test]
    fn test_layered_env_falls_through_to_process() {
        let interp = EnvironmentInterpolator::new(
            EnvPolicy::new().with_prefix("CARGO_"),
            LayeredEnv::new(MapEnv::new().with("CARGO_EXTRA", "x"), ProcessEnv),
        );
        let out = interp
            .apply_env_vars(Some("${env.CARGO_EXTRA}-${env.CARGO_PKG_NAME}"))
            .unwrap();
        assert_eq!(out, Some(format!("x-{}", env!("CARGO_PKG_NAME"))));
    }

    #[cfg(unix)]
    #[test]
    fn test_map_env_skips_non_utf8_variables() {
        use std::os::unix::ffi::OsStringExt;

        let env = MapEnv::from_os_vars(vec![
            (OsString::from("CONVERGDB_ENV"), OsString::from("prod")),
            (OsString::from("UNRELATED_BIN"), OsString::from_vec(vec![0x66, 0xff, 0x6f])),
            (OsString::from_vec(vec![0x66, 0xff]), OsString::from("value")),
        ]);
        assert_eq!(env.len(), 1);
        assert_eq!(env.var("CONVERGDB_ENV").as_deref(), Some("prod"));
        assert_eq!(env.var("UNRELATED_BIN"), None);
    }

    #[test]
    fn test_map_env_from_process() {
        let env = MapEnv::from_process();
        assert_eq!(env.var("CARGO_PKG_NAME").as_deref(), Some(env!("CARGO_PKG_NAME")));
    }

    #[test]
    fn test_apply_env_vars_to_attributes() {
        let interp = interpolator(MapEnv::new().with("CONVERGDB_REGION", "us-west-2"));
        let mut probe = Probe::new()
            .with("region", "${env.CONVERGDB_REGION}")
            .with("flag", true);
        interp
            .apply_env_vars_to_attributes(&mut probe, &["region", "flag", "unset"])
            .unwrap();
        assert_eq!(probe.get("region"), Some(&AttrValue::from("us-west-2")));
        assert_eq!(probe.get("flag"), Some(&AttrValue::Bool(true)));
        assert_eq!(probe.get("unset"), None);
    }

    #[test]
    fn test_apply_env_vars_to_attributes_stops_on_first_error() {
        let interp = interpolator(MapEnv::new().with("CONVERGDB_B", "b"));
        let mut probe = Probe::new()
            .with("first", "${env.CONVERGDB_MISSING}")
            .with("second", "${env.CONVERGDB_B}");
        let err = interp
            .apply_env_vars_to_attributes(&mut probe, &["first", "second"])
            .unwrap_err();
        assert!(err.is_configuration());
        // second was never reached
        assert_eq!(probe.get("second"), Some(&AttrValue::from("${env.CONVERGDB_B}")));
    }

    proptest! {
        #[test]
        fn prop_strings_without_placeholders_unchanged(s in "[a-zA-Z0-9 ./_-]{0,40}") {
            let interp = interpolator(MapEnv::new());
            let out = interp.apply_env_vars(Some(&s)).unwrap();
            prop_assert_eq!(out, Some(s));
        }

        #[test]
        fn prop_unprefixed_names_always_rejected(name in "[A-Z][A-Z0-9_]{0,12}") {
            prop_assume!(!name.starts_with("CONVERGDB_"));
            let interp = interpolator(MapEnv::new().with(name.clone(), "bound"));
            let placeholder = format!("${{env.{}}}", name);
            let err = interp.apply_env_vars(Some(&placeholder)).unwrap_err();
            prop_assert!(err.is_configuration());
        }
    }
}
