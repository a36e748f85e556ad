//! Plugin architecture for rule sets.
//!
//! A plugin is a named installer: a function that receives the rule
//! registry and registers whatever rules it provides. Installers are stored
//! by id and only run when the plugin is loaded.
//!
//! # Example
//! ```rust,ignore
//! use afx_a11y::{PluginRegistry, RuleRegistry};
//!
//! let plugins = PluginRegistry::new();
//! plugins.register_plugin("headings", |rules| {
//!     let _ = rules.register_rule("heading-order", check_heading_order, Some("h1, h2, h3"));
//! });
//!
//! let rules = RuleRegistry::new();
//! assert!(plugins.load_plugin("headings", &rules));
//! ```

use crate::RuleRegistry;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Installer run when a plugin is loaded.
pub type Installer = Arc<dyn Fn(&RuleRegistry) + Send + Sync>;

/// Installers keyed by plugin id.
#[derive(Default)]
pub struct PluginRegistry {
    installers: RwLock<HashMap<String, Installer>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an installer under `id`, replacing any previous one.
    pub fn register_plugin<F>(&self, id: &str, installer: F)
    where
        F: Fn(&RuleRegistry) + Send + Sync + 'static,
    {
        tracing::debug!(plugin = %id, "plugin registered");
        self.installers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), Arc::new(installer));
    }

    /// Run the installer stored under `id` against `rules`.
    ///
    /// Returns `false` (and does nothing) when no such plugin exists.
    pub fn load_plugin(&self, id: &str, rules: &RuleRegistry) -> bool {
        // Clone out so an installer may register further plugins
        let installer = self
            .installers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned();
        match installer {
            Some(install) => {
                tracing::debug!(plugin = %id, "loading plugin");
                install(rules);
                true
            }
            None => {
                tracing::debug!(plugin = %id, "unknown plugin");
                false
            }
        }
    }

    /// Registered plugin ids, sorted.
    pub fn plugin_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .installers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry").field("plugins", &self.plugin_ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Violation;

    #[test]
    fn test_load_runs_installer() {
        let plugins = PluginRegistry::new();
        plugins.register_plugin("extra", |rules| {
            let _ = rules.register_rule("extra-rule", |_, _| Ok(Some(Violation::info("x", "x"))), None);
        });

        let rules = RuleRegistry::new();
        assert!(rules.is_empty());
        assert!(plugins.load_plugin("extra", &rules));
        assert_eq!(rules.rule_ids(), vec!["extra-rule"]);
    }

    #[test]
    fn test_unknown_plugin_is_noop() {
        let plugins = PluginRegistry::new();
        let rules = RuleRegistry::new();
        assert!(!plugins.load_plugin("nope", &rules));
        assert!(rules.is_empty());
    }

    #[test]
    fn test_installer_not_run_until_loaded() {
        let plugins = PluginRegistry::new();
        plugins.register_plugin("b", |_| {});
        plugins.register_plugin("a", |rules| {
            let _ = rules.register_rule("a-rule", |_, _| Ok(None), None);
        });
        assert_eq!(plugins.plugin_ids(), vec!["a", "b"]);

        let rules = RuleRegistry::new();
        assert!(rules.is_empty());
        plugins.load_plugin("a", &rules);
        plugins.load_plugin("a", &rules);
        assert_eq!(rules.len(), 1);
    }
}
