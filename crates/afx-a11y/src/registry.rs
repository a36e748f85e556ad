//! Rule Registry
//!
//! One explicit, shareable mapping from rule id to rule. Registration is a
//! plain insert or overwrite: re-registering an id replaces the rule and
//! keeps the id's original position in `rule_ids()`.

use crate::config::RuleOptions;
use crate::{FnRule, RegistryError, Rule, RuleError, Violation};
use afx_dom::{Document, ElementRef, NodeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Entries {
    order: Vec<String>,
    rules: HashMap<String, Arc<dyn Rule>>,
}

/// Rule id → rule mapping
#[derive(Default)]
pub struct RuleRegistry {
    inner: RwLock<Entries>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a rule under its id
    pub fn register(&self, rule: Arc<dyn Rule>) {
        let id = rule.id().to_string();
        let mut entries = self.write();
        if entries.rules.insert(id.clone(), rule).is_some() {
            tracing::debug!(rule = %id, "rule overwritten");
        } else {
            tracing::debug!(rule = %id, "rule registered");
            entries.order.push(id);
        }
    }

    /// Register a closure, optionally restricted by a CSS selector
    pub fn register_rule<F>(&self, id: &str, check: F, selector: Option<&str>) -> Result<(), RegistryError>
    where
        F: Fn(ElementRef<'_>, &RuleOptions) -> Result<Option<Violation>, RuleError> + Send + Sync + 'static,
    {
        let mut rule = FnRule::new(id, check);
        if let Some(selector) = selector {
            rule = rule.with_selector(selector)?;
        }
        self.register(Arc::new(rule));
        Ok(())
    }

    /// Register a closure together with its fix
    pub fn register_rule_with_fix<F, X>(
        &self,
        id: &str,
        check: F,
        selector: Option<&str>,
        fix: X,
    ) -> Result<(), RegistryError>
    where
        F: Fn(ElementRef<'_>, &RuleOptions) -> Result<Option<Violation>, RuleError> + Send + Sync + 'static,
        X: Fn(&mut Document, NodeId, &RuleOptions) -> Result<(), RuleError> + Send + Sync + 'static,
    {
        let mut rule = FnRule::new(id, check).with_fix(fix);
        if let Some(selector) = selector {
            rule = rule.with_selector(selector)?;
        }
        self.register(Arc::new(rule));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Rule>> {
        self.read().rules.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().rules.contains_key(id)
    }

    /// Registered ids in first-registration order
    pub fn rule_ids(&self) -> Vec<String> {
        self.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry").field("rules", &self.rule_ids()).finish()
    }
}
