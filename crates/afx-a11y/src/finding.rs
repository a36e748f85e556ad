//! Findings
//!
//! A `Finding` is the immutable result of one rule flagging one element.
//! Rules produce a `Violation`; the engine attaches the element and rule id,
//! so a finding always points at an element the engine itself handed out.

use crate::RuleError;
use afx_dom::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of the synthetic finding produced when a rule fails
pub const RULE_ERROR_KIND: &str = "rule-error";

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// An accessibility issue found on one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Issue type, e.g. `missing-label`
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    /// The offending element (referenced, not owned)
    pub node: NodeId,
    pub rule_id: String,
    pub severity: Severity,
}

impl Finding {
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        node: NodeId,
        rule_id: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            node,
            rule_id: rule_id.into(),
            severity,
        }
    }

    /// Error-severity finding standing in for a rule that failed
    pub fn rule_error(rule_id: &str, node: NodeId, error: &RuleError) -> Self {
        Self::new(
            RULE_ERROR_KIND,
            format!("Error running rule: {error}"),
            node,
            rule_id,
            Severity::Error,
        )
    }

    pub fn is_rule_error(&self) -> bool {
        self.kind == RULE_ERROR_KIND
    }
}

/// What a rule reports about a single element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: String,
    pub message: String,
    pub severity: Severity,
}

impl Violation {
    pub fn new(kind: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            severity,
        }
    }

    pub fn info(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(kind, message, Severity::Info)
    }

    pub fn warning(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(kind, message, Severity::Warning)
    }

    pub fn error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(kind, message, Severity::Error)
    }

    /// Attach the flagged element and the reporting rule
    pub(crate) fn into_finding(self, node: NodeId, rule_id: &str) -> Finding {
        Finding {
            kind: self.kind,
            message: self.message,
            node,
            rule_id: rule_id.to_string(),
            severity: self.severity,
        }
    }
}
