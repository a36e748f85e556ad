//! Rule capability
//!
//! Every rule, however it was authored, is invoked through [`Rule`]. Plain
//! closures are adapted with [`FnRule`] when they are registered.

use crate::{config::RuleOptions, RegistryError, RuleError, Violation};
use afx_css::SelectorList;
use afx_dom::{Document, ElementRef, NodeId};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Per-element check: `Ok(None)` means the element passes
pub type CheckFn =
    dyn Fn(ElementRef<'_>, &RuleOptions) -> Result<Option<Violation>, RuleError> + Send + Sync;

/// Remediation of one flagged element
pub type FixFn = dyn Fn(&mut Document, NodeId, &RuleOptions) -> Result<(), RuleError> + Send + Sync;

/// An accessibility check applied to one element at a time.
///
/// `check` must not mutate the tree; it only sees it through `ElementRef`.
/// `fix` must be idempotent: applying it to an element that already passes
/// changes nothing.
pub trait Rule: Send + Sync {
    /// Stable identifier
    fn id(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Selector restricting candidate elements
    fn selector(&self) -> Option<&SelectorList> {
        None
    }

    /// Whether `element` is a candidate for this rule
    fn matches(&self, element: ElementRef<'_>) -> bool {
        self.selector().is_none_or(|s| s.matches(element))
    }

    fn check(&self, element: ElementRef<'_>, options: &RuleOptions) -> Result<Option<Violation>, RuleError>;

    fn supports_fix(&self) -> bool {
        false
    }

    fn fix(&self, document: &mut Document, node: NodeId, options: &RuleOptions) -> Result<(), RuleError> {
        let _ = (document, options);
        Err(RuleError::Fix(format!("rule '{}' cannot fix {node}", self.id())))
    }
}

/// Closure-backed rule
pub struct FnRule {
    id: String,
    description: String,
    selector: Option<SelectorList>,
    check: Box<CheckFn>,
    fix: Option<Box<FixFn>>,
}

impl FnRule {
    pub fn new<F>(id: impl Into<String>, check: F) -> Self
    where
        F: Fn(ElementRef<'_>, &RuleOptions) -> Result<Option<Violation>, RuleError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            description: String::new(),
            selector: None,
            check: Box::new(check),
            fix: None,
        }
    }

    /// Restrict candidates to elements matching `selector`
    pub fn with_selector(mut self, selector: &str) -> Result<Self, RegistryError> {
        let list = SelectorList::parse(selector).map_err(|source| RegistryError::InvalidSelector {
            rule_id: self.id.clone(),
            source,
        })?;
        self.selector = Some(list);
        Ok(self)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_fix<F>(mut self, fix: F) -> Self
    where
        F: Fn(&mut Document, NodeId, &RuleOptions) -> Result<(), RuleError> + Send + Sync + 'static,
    {
        self.fix = Some(Box::new(fix));
        self
    }
}

impl Rule for FnRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn selector(&self) -> Option<&SelectorList> {
        self.selector.as_ref()
    }

    fn check(&self, element: ElementRef<'_>, options: &RuleOptions) -> Result<Option<Violation>, RuleError> {
        (self.check)(element, options)
    }

    fn supports_fix(&self) -> bool {
        self.fix.is_some()
    }

    fn fix(&self, document: &mut Document, node: NodeId, options: &RuleOptions) -> Result<(), RuleError> {
        match &self.fix {
            Some(fix) => fix(document, node, options),
            None => Err(RuleError::Fix(format!("rule '{}' cannot fix {node}", self.id))),
        }
    }
}

impl fmt::Debug for FnRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule")
            .field("id", &self.id)
            .field("selector", &self.selector.as_ref().map(SelectorList::source))
            .field("fix", &self.fix.is_some())
            .finish()
    }
}

/// Run a rule body, converting a panic into `RuleError::Panicked`
pub(crate) fn guard<T>(f: impl FnOnce() -> Result<T, RuleError>) -> Result<T, RuleError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(RuleError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
