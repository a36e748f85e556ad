//! Audit rules
//!
//! Object-style rules for the [`RuleEngine`](crate::RuleEngine). Each one
//! queries its own candidates below the scan root (the body when auditing a
//! whole document) and reports every violation at once.

use crate::{AuditRule, Finding, RuleError, ScanRoot, Severity, TabIndex};
use afx_css::{effective_background, ComputedStyle, ContrastChecker, SelectorList, ROOT_FONT_SIZE};
use afx_dom::{Document, ElementRef, NodeId};
use std::sync::Arc;

/// `aria-attributes`, `color-contrast`, `keyboard-navigation`, `font-size`
pub fn default_audit_rules() -> Vec<Arc<dyn AuditRule>> {
    vec![
        Arc::new(AriaAttributesRule),
        Arc::new(ColorContrastRule),
        Arc::new(KeyboardNavigationRule),
        Arc::new(FontSizeRule),
    ]
}

/// Elements under `root` matching `selector`, as element views
fn select<'a>(document: &'a Document, root: ScanRoot, selector: &str) -> Result<Vec<ElementRef<'a>>, RuleError> {
    let tree = document.tree();
    let Some(scope) = root.query_scope(tree) else {
        return Ok(Vec::new());
    };
    let list = SelectorList::parse(selector)?;
    Ok(list
        .query_all(tree, scope)
        .into_iter()
        .filter_map(|id| tree.element(id))
        .collect())
}

fn finding(rule: &dyn AuditRule, kind: &str, message: String, node: NodeId, severity: Severity) -> Finding {
    Finding::new(kind, message, node, rule.id(), severity)
}

fn has_accessible_label(el: ElementRef<'_>) -> bool {
    el.has_attr("aria-label") || el.has_attr("aria-labelledby")
}

/// Button roles need an accessible name (WCAG 4.1.2)
#[derive(Debug, Clone, Copy, Default)]
pub struct AriaAttributesRule;

impl AuditRule for AriaAttributesRule {
    fn id(&self) -> &str {
        "aria-attributes"
    }

    fn description(&self) -> &str {
        "Ensure elements with ARIA roles have required ARIA attributes (WCAG 1.3.1, 4.1.2)."
    }

    fn check(&self, document: &Document, root: ScanRoot) -> Result<Vec<Finding>, RuleError> {
        Ok(select(document, root, "[role]")?
            .into_iter()
            .filter(|el| el.attr("role") == Some("button") && !has_accessible_label(*el))
            .map(|el| {
                finding(
                    self,
                    "missing-aria-label",
                    "Button role should have aria-label or aria-labelledby. (WCAG 4.1.2)".to_string(),
                    el.id(),
                    Severity::Error,
                )
            })
            .collect())
    }

    fn has_fix(&self) -> bool {
        true
    }

    fn fix(&self, document: &mut Document, root: ScanRoot) -> Result<(), RuleError> {
        let unlabeled: Vec<NodeId> = select(document, root, r#"[role="button"]"#)?
            .into_iter()
            .filter(|el| !has_accessible_label(*el))
            .map(|el| el.id())
            .collect();
        for node in unlabeled {
            document.tree_mut().set_attribute(node, "aria-label", "Button")?;
        }
        Ok(())
    }
}

/// Text must meet the WCAG AA contrast minimum (WCAG 1.4.3)
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorContrastRule;

impl AuditRule for ColorContrastRule {
    fn id(&self) -> &str {
        "color-contrast"
    }

    fn description(&self) -> &str {
        "Ensure text elements meet minimum color contrast requirements (WCAG 1.4.3)."
    }

    fn check(&self, document: &Document, root: ScanRoot) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();
        for el in select(document, root, "body, body *")? {
            if !el.has_own_text() {
                continue;
            }
            let style = ComputedStyle::of(el);
            let background = effective_background(el);
            let ratio = style.color.over(background).contrast_ratio(&background);
            let large = ContrastChecker::is_large_text(style.font_size, style.is_bold());
            if !ContrastChecker::meets_aa(ratio, large) {
                findings.push(finding(
                    self,
                    "insufficient-contrast",
                    format!("Insufficient contrast ratio ({ratio:.2}) for text element. (WCAG 1.4.3)"),
                    el.id(),
                    Severity::Error,
                ));
            }
        }
        Ok(findings)
    }
}

/// Interactive elements must be reachable with Tab (WCAG 2.1.1)
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyboardNavigationRule;

impl AuditRule for KeyboardNavigationRule {
    fn id(&self) -> &str {
        "keyboard-navigation"
    }

    fn description(&self) -> &str {
        "Ensure all interactive elements are accessible via keyboard navigation (WCAG 2.1.1, 2.4.3)."
    }

    fn check(&self, document: &Document, root: ScanRoot) -> Result<Vec<Finding>, RuleError> {
        Ok(select(document, root, "a, button, input, textarea, select, [tabindex]")?
            .into_iter()
            .filter(|el| !(el.is("input") && el.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("hidden"))))
            .filter(|el| !TabIndex::of(*el).is_sequential())
            .map(|el| {
                finding(
                    self,
                    "not-keyboard-focusable",
                    "Element is not focusable via keyboard navigation. (WCAG 2.1.1)".to_string(),
                    el.id(),
                    Severity::Warning,
                )
            })
            .collect())
    }
}

/// Text should be at least 16px (WCAG 1.4.4)
#[derive(Debug, Clone, Copy, Default)]
pub struct FontSizeRule;

impl AuditRule for FontSizeRule {
    fn id(&self) -> &str {
        "font-size"
    }

    fn description(&self) -> &str {
        "Ensure text elements use accessible font sizes (WCAG 1.4.4)."
    }

    fn check(&self, document: &Document, root: ScanRoot) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();
        for el in select(document, root, "body, body *")? {
            let size = ComputedStyle::of(el).font_size;
            if size < ROOT_FONT_SIZE {
                findings.push(finding(
                    self,
                    "small-font-size",
                    format!("Font size ({size}px) is below recommended minimum (16px). (WCAG 1.4.4)"),
                    el.id(),
                    Severity::Warning,
                ));
            }
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_with(doc: &mut Document, tag: &str, attrs: &[(&str, &str)], text: Option<&str>) -> NodeId {
        let body = doc.body().unwrap();
        let tree = doc.tree_mut();
        let id = tree.create_element_with_attrs(tag, attrs);
        tree.append_child(body, id).unwrap();
        if let Some(text) = text {
            let t = tree.create_text(text);
            tree.append_child(id, t).unwrap();
        }
        id
    }

    #[test]
    fn test_aria_attributes_check_and_fix() {
        let mut doc = Document::new("about:blank");
        let bare = body_with(&mut doc, "div", &[("role", "button")], Some("Go"));
        body_with(&mut doc, "div", &[("role", "button"), ("aria-label", "Close")], None);
        body_with(&mut doc, "div", &[("role", "navigation")], None);

        let rule = AriaAttributesRule;
        let found = rule.check(&doc, ScanRoot::Document).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node, bare);
        assert_eq!(found[0].severity, Severity::Error);

        rule.fix(&mut doc, ScanRoot::Document).unwrap();
        assert_eq!(doc.element(bare).unwrap().attr("aria-label"), Some("Button"));
        assert!(rule.check(&doc, ScanRoot::Document).unwrap().is_empty());
    }

    #[test]
    fn test_color_contrast() {
        let mut doc = Document::new("about:blank");
        let pale = body_with(&mut doc, "p", &[("style", "color: #aaa")], Some("pale"));
        body_with(&mut doc, "p", &[], Some("fine"));
        body_with(&mut doc, "h1", &[("style", "color: #888; font-size: 24px")], Some("large"));

        let found = ColorContrastRule.check(&doc, ScanRoot::Document).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node, pale);
        assert_eq!(found[0].kind, "insufficient-contrast");
        assert!(found[0].message.starts_with("Insufficient contrast ratio (2.32)"));
    }

    #[test]
    fn test_keyboard_navigation() {
        let mut doc = Document::new("about:blank");
        let removed = body_with(&mut doc, "button", &[("tabindex", "-1")], Some("x"));
        body_with(&mut doc, "button", &[], Some("ok"));
        body_with(&mut doc, "input", &[("type", "hidden")], None);
        let anchor = body_with(&mut doc, "a", &[], Some("no href"));

        let found = KeyboardNavigationRule.check(&doc, ScanRoot::Document).unwrap();
        let nodes: Vec<NodeId> = found.iter().map(|f| f.node).collect();
        assert_eq!(nodes, vec![removed, anchor]);
        assert!(found.iter().all(|f| f.severity == Severity::Warning));
    }

    #[test]
    fn test_font_size() {
        let mut doc = Document::new("about:blank");
        let small = body_with(&mut doc, "small", &[("style", "font-size: 12px")], Some("fine print"));
        body_with(&mut doc, "p", &[], Some("normal"));

        let found = FontSizeRule.check(&doc, ScanRoot::Document).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node, small);
        assert_eq!(
            found[0].message,
            "Font size (12px) is below recommended minimum (16px). (WCAG 1.4.4)"
        );
    }

    #[test]
    fn test_element_root_limits_scope() {
        let mut doc = Document::new("about:blank");
        body_with(&mut doc, "div", &[("role", "button")], None);
        let section = body_with(&mut doc, "section", &[], None);
        let inner = doc.tree_mut().create_element_with_attrs("span", &[("role", "button")]);
        doc.tree_mut().append_child(section, inner).unwrap();

        let found = AriaAttributesRule.check(&doc, ScanRoot::Node(section)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node, inner);
    }
}
