//! Rule Engine
//!
//! Orchestrates object-style audit rules: each rule checks a whole scan
//! root at once and may fix it. Every rule is isolated from the others in
//! both `run` and `fix_all`.

use crate::config::RuleOptions;
use crate::fix::FixFailure;
use crate::rule::guard;
use crate::rules::audit;
use crate::scanner::{candidates, flagged, ScanRoot};
use crate::{Finding, Rule, RuleError};
use afx_dom::Document;
use std::fmt;
use std::sync::Arc;

/// An audit over a whole document or subtree
pub trait AuditRule: Send + Sync {
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    /// Report every violation under `root`. Must not mutate the document.
    fn check(&self, document: &Document, root: ScanRoot) -> Result<Vec<Finding>, RuleError>;

    fn has_fix(&self) -> bool {
        false
    }

    /// Remediate violations under `root`; a second application is a no-op
    fn fix(&self, document: &mut Document, root: ScanRoot) -> Result<(), RuleError> {
        let _ = (document, root);
        Ok(())
    }
}

/// Ordered collection of audit rules
#[derive(Default)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn AuditRule>>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with `aria-attributes`, `color-contrast`, `keyboard-navigation`
    /// and `font-size`
    pub fn with_default_rules() -> Self {
        let mut engine = Self::new();
        for rule in audit::default_audit_rules() {
            engine.register_rule(rule);
        }
        engine
    }

    /// Append a rule; rules run in registration order
    pub fn register_rule(&mut self, rule: Arc<dyn AuditRule>) {
        tracing::debug!(rule = rule.id(), "audit rule registered");
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Arc<dyn AuditRule>] {
        &self.rules
    }

    /// Run every rule, concatenating results in registration order.
    ///
    /// A failing rule contributes one `rule-error` finding reported on the
    /// root element (the body for whole-document runs).
    pub fn run(&self, document: &Document, root: ScanRoot) -> Vec<Finding> {
        let mut results = Vec::new();
        for rule in &self.rules {
            match guard(|| rule.check(document, root)) {
                Ok(found) => results.extend(found),
                Err(err) => {
                    tracing::warn!(rule = rule.id(), %err, "audit rule failed");
                    let node = root.report_node(document.tree());
                    results.push(Finding::rule_error(rule.id(), node, &err));
                }
            }
        }
        tracing::debug!(rules = self.rules.len(), findings = results.len(), "audit complete");
        results
    }

    /// Run every available fix, returning the ones that failed
    pub fn fix_all(&self, document: &mut Document, root: ScanRoot) -> Vec<FixFailure> {
        let mut failures = Vec::new();
        for rule in self.rules.iter().filter(|r| r.has_fix()) {
            if let Err(error) = guard(|| rule.fix(document, root)) {
                tracing::warn!(rule = rule.id(), %error, "fix failed");
                failures.push(FixFailure {
                    rule_id: rule.id().to_string(),
                    node: None,
                    error,
                });
            }
        }
        failures
    }
}

impl fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.rules.iter().map(|r| r.id()).collect();
        f.debug_struct("RuleEngine").field("rules", &ids).finish()
    }
}

/// Runs a per-element [`Rule`] as an audit rule
pub struct ElementRuleAudit {
    rule: Arc<dyn Rule>,
    options: RuleOptions,
    include_hidden: bool,
}

impl ElementRuleAudit {
    pub fn new(rule: Arc<dyn Rule>) -> Self {
        Self {
            rule,
            options: RuleOptions::default(),
            include_hidden: false,
        }
    }

    pub fn with_options(mut self, options: RuleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }
}

impl AuditRule for ElementRuleAudit {
    fn id(&self) -> &str {
        self.rule.id()
    }

    fn description(&self) -> &str {
        self.rule.description()
    }

    fn check(&self, document: &Document, root: ScanRoot) -> Result<Vec<Finding>, RuleError> {
        let tree = document.tree();
        let mut traversal = None;
        let mut findings = Vec::new();
        for element in candidates(tree, self.rule.as_ref(), root, self.include_hidden, &mut traversal)
            .into_iter()
            .filter_map(|id| tree.element(id))
        {
            if let Some(violation) = self.rule.check(element, &self.options)? {
                findings.push(violation.into_finding(element.id(), self.rule.id()));
            }
        }
        Ok(findings)
    }

    fn has_fix(&self) -> bool {
        self.rule.supports_fix()
    }

    fn fix(&self, document: &mut Document, root: ScanRoot) -> Result<(), RuleError> {
        let nodes = flagged(document.tree(), self.rule.as_ref(), root, self.include_hidden, &self.options)
            .map_err(|(_, err)| err)?;
        for node in nodes {
            self.rule.fix(document, node, &self.options)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FnRule, Severity, Violation};
    use afx_dom::NodeId;

    struct Fixed {
        id: &'static str,
        findings: usize,
    }

    impl AuditRule for Fixed {
        fn id(&self) -> &str {
            self.id
        }

        fn description(&self) -> &str {
            "reports a fixed number of findings"
        }

        fn check(&self, document: &Document, _root: ScanRoot) -> Result<Vec<Finding>, RuleError> {
            let body = document.body().unwrap_or(NodeId::ROOT);
            Ok((0..self.findings)
                .map(|_| Finding::new("fixed", "fixed", body, self.id, Severity::Info))
                .collect())
        }
    }

    struct Failing;

    impl AuditRule for Failing {
        fn id(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        fn check(&self, _: &Document, _: ScanRoot) -> Result<Vec<Finding>, RuleError> {
            Err(RuleError::Failed("no luck".into()))
        }

        fn has_fix(&self) -> bool {
            true
        }

        fn fix(&self, _: &mut Document, _: ScanRoot) -> Result<(), RuleError> {
            panic!("fix blew up")
        }
    }

    #[test]
    fn test_run_concatenates_in_registration_order() {
        let mut engine = RuleEngine::new();
        engine.register_rule(Arc::new(Fixed { id: "a", findings: 2 }));
        engine.register_rule(Arc::new(Fixed { id: "b", findings: 1 }));

        let doc = Document::new("about:blank");
        let ids: Vec<String> = engine
            .run(&doc, ScanRoot::Document)
            .into_iter()
            .map(|f| f.rule_id)
            .collect();
        assert_eq!(ids, vec!["a", "a", "b"]);
    }

    #[test]
    fn test_failing_rule_becomes_finding() {
        let mut engine = RuleEngine::new();
        engine.register_rule(Arc::new(Failing));
        engine.register_rule(Arc::new(Fixed { id: "ok", findings: 1 }));

        let doc = Document::new("about:blank");
        let results = engine.run(&doc, ScanRoot::Document);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].rule_id, "failing");
        assert_eq!(results[0].severity, Severity::Error);
        assert_eq!(results[0].message, "Error running rule: no luck");
        assert_eq!(results[0].node, doc.body().unwrap());
        assert_eq!(results[1].rule_id, "ok");
    }

    #[test]
    fn test_failure_on_element_root_is_reported_there() {
        let mut engine = RuleEngine::new();
        engine.register_rule(Arc::new(Failing));

        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let div = doc.tree_mut().create_element("div");
        doc.tree_mut().append_child(body, div).unwrap();

        let results = engine.run(&doc, ScanRoot::Node(div));
        assert_eq!(results[0].node, div);
    }

    #[test]
    fn test_fix_all_isolates_failures() {
        let mut engine = RuleEngine::new();
        engine.register_rule(Arc::new(Failing));
        engine.register_rule(Arc::new(Fixed { id: "no-fix", findings: 0 }));

        let mut doc = Document::new("about:blank");
        let failures = engine.fix_all(&mut doc, ScanRoot::Document);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].rule_id, "failing");
        assert!(matches!(failures[0].error, RuleError::Panicked(_)));
    }

    #[test]
    fn test_element_rule_adapter() {
        let rule = FnRule::new("needs-alt", |el, _| {
            Ok((!el.has_attr("alt")).then(|| Violation::error("missing-alt", "Image has no alt text")))
        })
        .with_selector("img")
        .unwrap()
        .with_fix(|doc, node, _| Ok(doc.tree_mut().set_attribute(node, "alt", "")?));

        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let img = doc.tree_mut().create_element("img");
        doc.tree_mut().append_child(body, img).unwrap();

        let mut engine = RuleEngine::new();
        engine.register_rule(Arc::new(ElementRuleAudit::new(Arc::new(rule))));

        let results = engine.run(&doc, ScanRoot::Document);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].node, img);
        assert_eq!(results[0].kind, "missing-alt");

        assert!(engine.fix_all(&mut doc, ScanRoot::Document).is_empty());
        assert!(engine.run(&doc, ScanRoot::Document).is_empty());
    }

    #[test]
    fn test_default_rules() {
        let engine = RuleEngine::with_default_rules();
        let ids: Vec<&str> = engine.rules().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["aria-attributes", "color-contrast", "keyboard-navigation", "font-size"]);
    }
}
