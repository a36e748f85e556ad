//! Configuration Resolver
//!
//! Turns a caller-supplied [`ScannerConfig`] into the effective rule list of
//! a scan and the options object each rule receives. Everything here is a
//! pure function of its inputs and needs no document.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Scanner configuration as supplied by the settings store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScannerConfig {
    /// Keep only these rule ids
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_rules: Option<Vec<String>>,
    /// Drop these rule ids (applied after `enabled_rules`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_rules: Option<Vec<String>>,
    /// Opaque options per rule id
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub rule_options: HashMap<String, Value>,
    /// Site identifier, carried into scan logs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
}

impl ScannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_enabled_rules<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_rules = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_disabled_rules<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled_rules = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_rule_options(mut self, rule_id: impl Into<String>, options: Value) -> Self {
        self.rule_options.insert(rule_id.into(), options);
        self
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }
}

/// Options object handed to a rule; always a JSON object, possibly empty
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOptions(Map<String, Value>);

impl RuleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; anything but an object becomes `{}`
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for RuleOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Effective rule ids of a scan, in order
///
/// Starts from `requested` (or every registered id), keeps only
/// `enabled_rules` when given, then removes `disabled_rules`. An id listed
/// in both is therefore excluded. Ids need not be registered.
pub fn resolve_rule_ids(
    registered: &[String],
    requested: Option<&[String]>,
    config: Option<&ScannerConfig>,
) -> Vec<String> {
    let candidates = requested.unwrap_or(registered);
    let Some(config) = config else {
        return candidates.to_vec();
    };
    candidates
        .iter()
        .filter(|id| config.enabled_rules.as_ref().is_none_or(|enabled| enabled.contains(*id)))
        .filter(|id| !config.disabled_rules.as_ref().is_some_and(|disabled| disabled.contains(*id)))
        .cloned()
        .collect()
}

/// Options for `rule_id`, `{}` when none are configured
pub fn rule_options(rule_id: &str, config: Option<&ScannerConfig>) -> RuleOptions {
    config
        .and_then(|c| c.rule_options.get(rule_id))
        .cloned()
        .map(RuleOptions::from_value)
        .unwrap_or_default()
}

/// Settings store collaborator: hands out the current configuration
pub trait ConfigSource {
    fn current(&self) -> ScannerConfig;
}

/// Fixed configuration
#[derive(Debug, Clone, Default)]
pub struct StaticConfig(pub ScannerConfig);

impl ConfigSource for StaticConfig {
    fn current(&self) -> ScannerConfig {
        self.0.clone()
    }
}
