//! Scan Engine
//!
//! One scan pass: resolve the effective rules, resolve each rule's
//! candidate elements, drop elements that are not rendered, and run the
//! rule on every remaining candidate. Rules run strictly in sequence on the
//! calling thread.

use crate::config::{resolve_rule_ids, rule_options, RuleOptions, ScannerConfig};
use crate::fix::{FixDispatcher, FixReport};
use crate::rule::guard;
use crate::rules::builtin;
use crate::{Finding, PluginRegistry, RegistryError, Rule, RuleError, RuleRegistry, Violation};
use afx_css::is_rendered;
use afx_dom::{collect, Document, DomTree, ElementRef, NodeId};
use std::sync::Arc;

/// Where a scan starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanRoot {
    /// The whole top-level document (traversed from its body)
    #[default]
    Document,
    /// A single element, shadow root or nested document
    Node(NodeId),
}

impl ScanRoot {
    /// Node handed to the tree walker
    pub fn node(self) -> NodeId {
        match self {
            Self::Document => NodeId::ROOT,
            Self::Node(id) => id,
        }
    }

    /// Scope of selector queries: the body when the root is a document
    pub(crate) fn query_scope(self, tree: &DomTree) -> Option<NodeId> {
        let node = self.node();
        match tree.get(node) {
            Some(n) if n.as_document().is_some() => tree.body_of(node),
            Some(_) => Some(node),
            None => None,
        }
    }

    /// Element standing in for the root when a finding has no better node
    pub(crate) fn report_node(self, tree: &DomTree) -> NodeId {
        match self {
            Self::Document => tree.body_of(NodeId::ROOT).unwrap_or(NodeId::ROOT),
            Self::Node(id) => id,
        }
    }
}

/// Options of one scan
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub root: ScanRoot,
    /// Also examine elements that are not rendered
    pub include_hidden: bool,
    /// Rule ids to run; every registered rule when `None`
    pub rules: Option<Vec<String>>,
    pub config: Option<ScannerConfig>,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: ScanRoot) -> Self {
        self.root = root;
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn with_rules<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_config(mut self, config: ScannerConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// Rule registry, plugins and the scan entry points
#[derive(Debug, Default)]
pub struct Scanner {
    registry: Arc<RuleRegistry>,
    plugins: PluginRegistry,
}

impl Scanner {
    /// Scanner with an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Scanner sharing an existing registry
    pub fn with_registry(registry: Arc<RuleRegistry>) -> Self {
        Self {
            registry,
            plugins: PluginRegistry::new(),
        }
    }

    /// Scanner with the standard rule set registered
    pub fn with_built_in_rules() -> Result<Self, RegistryError> {
        let scanner = Self::new();
        scanner.register_built_in_rules()?;
        Ok(scanner)
    }

    /// Register the standard rule set; registering it again changes nothing
    pub fn register_built_in_rules(&self) -> Result<(), RegistryError> {
        builtin::register_built_in_rules(&self.registry)
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn register(&self, rule: Arc<dyn Rule>) {
        self.registry.register(rule);
    }

    pub fn register_rule<F>(&self, id: &str, check: F, selector: Option<&str>) -> Result<(), RegistryError>
    where
        F: Fn(ElementRef<'_>, &RuleOptions) -> Result<Option<Violation>, RuleError> + Send + Sync + 'static,
    {
        self.registry.register_rule(id, check, selector)
    }

    pub fn register_plugin<F>(&self, id: &str, installer: F)
    where
        F: Fn(&RuleRegistry) + Send + Sync + 'static,
    {
        self.plugins.register_plugin(id, installer);
    }

    /// Install a registered plugin's rules; unknown ids are ignored
    pub fn load_plugin(&self, id: &str) -> bool {
        self.plugins.load_plugin(id, &self.registry)
    }

    pub fn rule_ids(&self) -> Vec<String> {
        self.registry.rule_ids()
    }

    /// Run every effective rule over its candidates and collect findings.
    ///
    /// Findings come in rule order, then candidate order. When a rule fails
    /// on a candidate, one `rule-error` finding is reported on that element
    /// and the rule's remaining candidates are skipped; other rules are not
    /// affected.
    pub fn scan(&self, document: &Document, options: &ScanOptions) -> Vec<Finding> {
        // Snapshot: later changes by the caller cannot reach this pass
        let config = options.config.clone();
        let rule_ids = resolve_rule_ids(&self.registry.rule_ids(), options.rules.as_deref(), config.as_ref());

        let tree = document.tree();
        let mut traversal = None;
        let mut findings = Vec::new();
        let mut examined = 0usize;
        let mut rules_run = 0usize;

        for rule_id in &rule_ids {
            let Some(rule) = self.registry.get(rule_id) else {
                tracing::trace!(rule = %rule_id, "skipping unregistered rule");
                continue;
            };
            rules_run += 1;
            let options_for_rule = rule_options(rule_id, config.as_ref());
            let candidates = candidates(tree, rule.as_ref(), options.root, options.include_hidden, &mut traversal);
            examined += candidates.len();

            for element in candidates.into_iter().filter_map(|id| tree.element(id)) {
                match guard(|| rule.check(element, &options_for_rule)) {
                    Ok(Some(violation)) => findings.push(violation.into_finding(element.id(), rule_id)),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(rule = %rule_id, node = %element.id(), %err, "rule failed");
                        findings.push(Finding::rule_error(rule_id, element.id(), &err));
                        break;
                    }
                }
            }
        }

        tracing::debug!(
            site = config.as_ref().and_then(|c| c.site.as_deref()).unwrap_or("-"),
            rules = rules_run,
            candidates = examined,
            findings = findings.len(),
            "scan complete"
        );
        findings
    }

    /// Apply the fixes of every effective rule that has one
    pub fn apply_fixes(&self, document: &mut Document, options: &ScanOptions) -> FixReport {
        FixDispatcher::apply(&self.registry, document, options)
    }
}

/// Candidate elements of `rule` under `root`, in document order.
///
/// Selector rules query the root's scope; other rules filter the full
/// traversal, computed at most once per pass through `traversal`.
pub(crate) fn candidates(
    tree: &DomTree,
    rule: &dyn Rule,
    root: ScanRoot,
    include_hidden: bool,
    traversal: &mut Option<Vec<NodeId>>,
) -> Vec<NodeId> {
    let nodes = match rule.selector() {
        Some(selector) => match root.query_scope(tree) {
            Some(scope) => selector.query_all(tree, scope),
            None => Vec::new(),
        },
        None => traversal
            .get_or_insert_with(|| collect(tree, root.node()))
            .iter()
            .copied()
            .filter(|&id| tree.element(id).is_some_and(|el| rule.matches(el)))
            .collect(),
    };
    if include_hidden {
        return nodes;
    }
    nodes
        .into_iter()
        .filter(|&id| tree.element(id).is_some_and(is_rendered))
        .collect()
}

/// Elements `rule` currently flags, with the first failure if any
pub(crate) fn flagged(
    tree: &DomTree,
    rule: &dyn Rule,
    root: ScanRoot,
    include_hidden: bool,
    options: &RuleOptions,
) -> Result<Vec<NodeId>, (NodeId, RuleError)> {
    let mut traversal = None;
    let mut nodes = Vec::new();
    for element in candidates(tree, rule, root, include_hidden, &mut traversal)
        .into_iter()
        .filter_map(|id| tree.element(id))
    {
        match guard(|| rule.check(element, options)) {
            Ok(Some(_)) => nodes.push(element.id()),
            Ok(None) => {}
            Err(err) => return Err((element.id(), err)),
        }
    }
    Ok(nodes)
}
