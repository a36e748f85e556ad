//! Built-in rules
//!
//! `builtin` holds the per-element rules installed into a scanner's
//! registry; `audit` holds the object-style rules run by the
//! [`RuleEngine`](crate::RuleEngine).

pub mod audit;
pub mod builtin;

pub use audit::{default_audit_rules, AriaAttributesRule, ColorContrastRule, FontSizeRule, KeyboardNavigationRule};
pub use builtin::{register_built_in_rules, BUILT_IN_RULE_IDS};
