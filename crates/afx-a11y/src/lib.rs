//! AccessiFix Accessibility Engine
//!
//! Rule evaluation for in-page accessibility auditing.
//!
//! Features:
//! - Rule registry with plugin-style bulk registration
//! - Scan engine with per-rule fault isolation
//! - Object-style rule engine with auto-fix
//! - Debounced re-scanning driven by DOM mutations
//! - Built-in keyboard, ARIA, contrast, form and typography rules

pub mod aria;
pub mod focus;
pub mod config;
pub mod rules;
mod finding;
mod rule;
mod registry;
mod plugin;
mod scanner;
mod engine;
mod fix;
mod watcher;

pub use aria::AriaRole;
pub use focus::TabIndex;
pub use config::{resolve_rule_ids, rule_options, ConfigSource, RuleOptions, ScannerConfig, StaticConfig};
pub use finding::{Finding, Severity, Violation, RULE_ERROR_KIND};
pub use rule::{CheckFn, FixFn, FnRule, Rule};
pub use registry::RuleRegistry;
pub use plugin::{Installer, PluginRegistry};
pub use scanner::{ScanOptions, ScanRoot, Scanner};
pub use engine::{AuditRule, ElementRuleAudit, RuleEngine};
pub use fix::{FixDispatcher, FixFailure, FixReport};
pub use watcher::{MutationWatcher, SharedDocument, Subscription, DEFAULT_DEBOUNCE};

use afx_css::SelectorError;
use afx_dom::{DomError, NodeId};

/// Failure of a single rule invocation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("{0}")]
    Failed(String),

    #[error("rule panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Fix(String),

    #[error(transparent)]
    InvalidSelector(#[from] SelectorError),

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Rule registration error
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("rule '{rule_id}' has an invalid selector")]
    InvalidSelector {
        rule_id: String,
        #[source]
        source: SelectorError,
    },
}

/// Mutation watcher setup error
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("{0} cannot be observed")]
    InvalidRoot(NodeId),

    #[error("document is mutably borrowed")]
    DocumentBusy,
}

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid scanner configuration: {0}")]
    Json(#[from] serde_json::Error),
}
