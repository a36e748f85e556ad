//! Fix Dispatcher
//!
//! Runs the remediation of every effective rule that has one. Each rule is
//! isolated: its failure is recorded and stops only that rule.

use crate::config::{resolve_rule_ids, rule_options};
use crate::rule::guard;
use crate::scanner::{flagged, ScanOptions};
use crate::{RuleError, RuleRegistry};
use afx_dom::{Document, NodeId};
use std::fmt;

/// A fix that could not be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixFailure {
    pub rule_id: String,
    /// Element being fixed, when the failure concerns one
    pub node: Option<NodeId>,
    pub error: RuleError,
}

impl fmt::Display for FixFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Some(node) => write!(f, "{} on {}: {}", self.rule_id, node, self.error),
            None => write!(f, "{}: {}", self.rule_id, self.error),
        }
    }
}

/// Outcome of one fix pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixReport {
    /// (rule id, element) for every applied fix, in application order
    pub applied: Vec<(String, NodeId)>,
    pub failures: Vec<FixFailure>,
}

impl FixReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct FixDispatcher;

impl FixDispatcher {
    /// Fix every element the effective fixable rules currently flag.
    ///
    /// Flagged elements of a rule are determined before any of its fixes
    /// run; the next rule sees the document as the previous one left it.
    pub fn apply(registry: &RuleRegistry, document: &mut Document, options: &ScanOptions) -> FixReport {
        let config = options.config.clone();
        let rule_ids = resolve_rule_ids(&registry.rule_ids(), options.rules.as_deref(), config.as_ref());
        let mut report = FixReport::default();

        for rule_id in rule_ids {
            let Some(rule) = registry.get(&rule_id) else {
                continue;
            };
            if !rule.supports_fix() {
                continue;
            }
            let options_for_rule = rule_options(&rule_id, config.as_ref());

            let nodes = match flagged(document.tree(), rule.as_ref(), options.root, options.include_hidden, &options_for_rule) {
                Ok(nodes) => nodes,
                Err((node, error)) => {
                    tracing::warn!(rule = %rule_id, %node, %error, "check failed before fixing");
                    report.failures.push(FixFailure {
                        rule_id,
                        node: Some(node),
                        error,
                    });
                    continue;
                }
            };

            for node in nodes {
                match guard(|| rule.fix(document, node, &options_for_rule)) {
                    Ok(()) => report.applied.push((rule_id.clone(), node)),
                    Err(error) => {
                        tracing::warn!(rule = %rule_id, %node, %error, "fix failed");
                        report.failures.push(FixFailure {
                            rule_id: rule_id.clone(),
                            node: Some(node),
                            error,
                        });
                        break;
                    }
                }
            }
        }

        tracing::debug!(applied = report.applied.len(), failed = report.failures.len(), "fix pass complete");
        report
    }
}
