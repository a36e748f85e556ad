//! Per-element rules
//!
//! The standard scanner rule set. Registering it twice leaves the registry
//! unchanged: every rule is overwritten in place by an identical one.

use crate::config::RuleOptions;
use crate::{AriaRole, RegistryError, RuleError, RuleRegistry, TabIndex, Violation};
use afx_css::{effective_background, outline_shorthand_style, ComputedStyle, ContrastChecker, InlineStyle};
use afx_dom::{Document, ElementRef, NodeId};

/// Ids of the standard rules, in registration order
pub const BUILT_IN_RULE_IDS: &[&str] = &[
    "keyboard-navigation",
    "focus-indicator",
    "aria-landmark",
    "wcag-contrast",
    "contrast",
    "input-label",
    "aria-role",
    "form-field",
];

/// WCAG AA minimum for normal text
pub const DEFAULT_MIN_RATIO: f64 = 4.5;
/// WCAG AA minimum for large text
pub const DEFAULT_LARGE_TEXT_RATIO: f64 = 3.0;

/// Install the standard rules into `registry`
pub fn register_built_in_rules(registry: &RuleRegistry) -> Result<(), RegistryError> {
    registry.register_rule("keyboard-navigation", keyboard_navigation, None)?;
    registry.register_rule("focus-indicator", focus_indicator, None)?;
    registry.register_rule("aria-landmark", aria_landmark, None)?;
    registry.register_rule("wcag-contrast", wcag_contrast, None)?;
    registry.register_rule("contrast", contrast, None)?;
    registry.register_rule_with_fix("input-label", input_label, Some("input"), label_input)?;
    registry.register_rule("aria-role", aria_role, Some("[role]"))?;
    registry.register_rule("form-field", form_field, Some("form"))?;
    tracing::debug!(rules = BUILT_IN_RULE_IDS.len(), "built-in rules registered");
    Ok(())
}

fn keyboard_navigation(el: ElementRef<'_>, _: &RuleOptions) -> Result<Option<Violation>, RuleError> {
    if !TabIndex::of(el).is_sequential() {
        return Ok(None);
    }
    // Skip links are fine without a role
    if el.is("a") && el.attr("href") == Some("#main") {
        return Ok(None);
    }
    if el.attr("role").is_some_and(|role| !role.trim().is_empty()) {
        return Ok(None);
    }
    Ok(Some(Violation::info(
        "tab-navigation",
        "Element is focusable but has no ARIA role",
    )))
}

fn focus_indicator(el: ElementRef<'_>, _: &RuleOptions) -> Result<Option<Violation>, RuleError> {
    if !TabIndex::of(el).is_sequential() {
        return Ok(None);
    }
    let outline = match InlineStyle::of(el).get("outline").filter(|v| !v.trim().is_empty()) {
        Some(value) => outline_shorthand_style(value),
        None => ComputedStyle::of(el).outline_style,
    };
    if outline.is_empty() || outline == "none" {
        return Ok(Some(Violation::warning(
            "missing-focus-indicator",
            "Focusable element lacks visible focus indicator",
        )));
    }
    Ok(None)
}

fn aria_landmark(el: ElementRef<'_>, _: &RuleOptions) -> Result<Option<Violation>, RuleError> {
    let landmark = el
        .attr("role")
        .and_then(AriaRole::from_attribute)
        .filter(AriaRole::is_landmark);
    Ok(landmark.map(|role| Violation::info("aria-landmark", format!("Element is an ARIA landmark: {role}"))))
}

fn wcag_contrast(el: ElementRef<'_>, options: &RuleOptions) -> Result<Option<Violation>, RuleError> {
    if !el.has_own_text() {
        return Ok(None);
    }
    let min_ratio = ratio_option(options, "minRatio", DEFAULT_MIN_RATIO)?;
    let large_ratio = ratio_option(options, "largeTextRatio", DEFAULT_LARGE_TEXT_RATIO)?;

    let style = ComputedStyle::of(el);
    let background = effective_background(el);
    let ratio = style.color.over(background).contrast_ratio(&background);
    let required = if ContrastChecker::is_large_text(style.font_size, style.is_bold()) {
        large_ratio
    } else {
        min_ratio
    };
    if ratio < required {
        return Ok(Some(Violation::error(
            "wcag-low-contrast",
            format!("Text contrast ratio is {ratio:.2} (WCAG AA requires {required})"),
        )));
    }
    Ok(None)
}

fn ratio_option(options: &RuleOptions, key: &str, default: f64) -> Result<f64, RuleError> {
    match options.get(key) {
        None => Ok(default),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| RuleError::Failed(format!("option '{key}' must be a number, got {value}"))),
    }
}

fn contrast(el: ElementRef<'_>, _: &RuleOptions) -> Result<Option<Violation>, RuleError> {
    if !el.has_own_text() {
        return Ok(None);
    }
    let background = effective_background(el);
    if ComputedStyle::of(el).color.over(background) == background {
        return Ok(Some(Violation::error("low-contrast", "Text color matches background color")));
    }
    Ok(None)
}

fn input_label(el: ElementRef<'_>, _: &RuleOptions) -> Result<Option<Violation>, RuleError> {
    if is_labelled(el) {
        return Ok(None);
    }
    Ok(Some(Violation::warning(
        "missing-label",
        "Input element missing label or ARIA label",
    )))
}

/// `aria-label`, `aria-labelledby`, `<label for>` in the same tree scope, or
/// an enclosing `<label>`
fn is_labelled(el: ElementRef<'_>) -> bool {
    if el.has_attr("aria-label") || el.has_attr("aria-labelledby") {
        return true;
    }
    let tree = el.tree();
    if let Some(id) = el.attr("id").filter(|id| !id.is_empty()) {
        let explicit = tree
            .descendants(el.scope_root())
            .filter_map(|n| tree.element(n))
            .any(|label| label.is("label") && label.attr("for") == Some(id));
        if explicit {
            return true;
        }
    }
    std::iter::successors(el.parent_element(), |p| p.parent_element()).any(|p| p.is("label"))
}

/// Derive an `aria-label` from the input's own hints
fn label_input(doc: &mut Document, node: NodeId, _: &RuleOptions) -> Result<(), RuleError> {
    let el = doc
        .element(node)
        .ok_or_else(|| RuleError::Fix(format!("{node} is not an element")))?;
    if is_labelled(el) {
        return Ok(());
    }
    let label = ["placeholder", "title", "name"]
        .iter()
        .find_map(|attr| el.attr(attr).map(str::trim).filter(|v| !v.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| RuleError::Fix(format!("nothing to derive a label for {node} from")))?;
    doc.tree_mut().set_attribute(node, "aria-label", &label)?;
    Ok(())
}

fn aria_role(el: ElementRef<'_>, _: &RuleOptions) -> Result<Option<Violation>, RuleError> {
    let Some(role) = el.attr("role").filter(|r| !r.trim().is_empty()) else {
        return Ok(None);
    };
    if AriaRole::from_attribute(role).is_some() {
        return Ok(None);
    }
    Ok(Some(Violation::info("unknown-aria-role", format!("Unknown ARIA role: {role}"))))
}

fn form_field(el: ElementRef<'_>, _: &RuleOptions) -> Result<Option<Violation>, RuleError> {
    let has_field = el
        .descendant_elements()
        .any(|d| d.is("input") || d.is("select") || d.is("textarea"));
    if has_field {
        return Ok(None);
    }
    Ok(Some(Violation::warning("empty-form", "Form has no input fields")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use afx_dom::DomTree;
    use serde_json::json;

    fn element(tree: &mut DomTree, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let body = tree.body_of(NodeId::ROOT).unwrap();
        let id = tree.create_element_with_attrs(tag, attrs);
        tree.append_child(body, id).unwrap();
        id
    }

    fn with_text(tree: &mut DomTree, tag: &str, attrs: &[(&str, &str)], text: &str) -> NodeId {
        let id = element(tree, tag, attrs);
        let t = tree.create_text(text);
        tree.append_child(id, t).unwrap();
        id
    }

    fn kind(result: Result<Option<Violation>, RuleError>) -> Option<String> {
        result.unwrap().map(|v| v.kind)
    }

    #[test]
    fn test_keyboard_navigation() {
        let mut doc = Document::new("about:blank");
        let tree = doc.tree_mut();
        let div = element(tree, "div", &[("tabindex", "0")]);
        let skip = element(tree, "a", &[("href", "#main")]);
        let with_role = element(tree, "div", &[("tabindex", "0"), ("role", "button")]);
        let plain = element(tree, "div", &[]);

        let opts = RuleOptions::default();
        let tree = doc.tree();
        assert_eq!(kind(keyboard_navigation(tree.element(div).unwrap(), &opts)).as_deref(), Some("tab-navigation"));
        assert_eq!(kind(keyboard_navigation(tree.element(skip).unwrap(), &opts)), None);
        assert_eq!(kind(keyboard_navigation(tree.element(with_role).unwrap(), &opts)), None);
        assert_eq!(kind(keyboard_navigation(tree.element(plain).unwrap(), &opts)), None);
    }

    #[test]
    fn test_focus_indicator() {
        let mut doc = Document::new("about:blank");
        let tree = doc.tree_mut();
        let none = element(tree, "button", &[("style", "outline: none")]);
        let auto = element(tree, "button", &[("style", "outline: auto")]);
        let solid = element(tree, "a", &[("href", "/"), ("style", "outline: 2px solid blue")]);
        let style_only = element(tree, "button", &[("style", "outline-style: dotted")]);

        let opts = RuleOptions::default();
        let tree = doc.tree();
        assert!(kind(focus_indicator(tree.element(none).unwrap(), &opts)).is_some());
        assert!(kind(focus_indicator(tree.element(auto).unwrap(), &opts)).is_none());
        assert!(kind(focus_indicator(tree.element(solid).unwrap(), &opts)).is_none());
        assert!(kind(focus_indicator(tree.element(style_only).unwrap(), &opts)).is_none());
    }

    #[test]
    fn test_aria_landmark() {
        let mut doc = Document::new("about:blank");
        let tree = doc.tree_mut();
        let nav = element(tree, "div", &[("role", "navigation")]);
        let button = element(tree, "div", &[("role", "button")]);

        let opts = RuleOptions::default();
        let tree = doc.tree();
        let found = aria_landmark(tree.element(nav).unwrap(), &opts).unwrap().unwrap();
        assert_eq!(found.message, "Element is an ARIA landmark: navigation");
        assert!(aria_landmark(tree.element(button).unwrap(), &opts).unwrap().is_none());
    }

    #[test]
    fn test_wcag_contrast() {
        let mut doc = Document::new("about:blank");
        let tree = doc.tree_mut();
        let grey = with_text(tree, "p", &[("style", "color: #777; background: #fff")], "Faint");
        let black = with_text(tree, "p", &[("style", "color: #000; background: #fff")], "Strong");
        let large = with_text(tree, "p", &[("style", "color: #888; font-size: 32px")], "Large");
        let empty = element(tree, "p", &[("style", "color: #fff")]);

        let opts = RuleOptions::default();
        let tree = doc.tree();
        let found = wcag_contrast(tree.element(grey).unwrap(), &opts).unwrap().unwrap();
        assert_eq!(found.kind, "wcag-low-contrast");
        assert_eq!(found.message, "Text contrast ratio is 4.48 (WCAG AA requires 4.5)");
        assert!(kind(wcag_contrast(tree.element(black).unwrap(), &opts)).is_none());
        assert!(kind(wcag_contrast(tree.element(large).unwrap(), &opts)).is_none());
        assert!(kind(wcag_contrast(tree.element(empty).unwrap(), &opts)).is_none());

        let strict = RuleOptions::from_value(json!({ "minRatio": 7 }));
        assert!(kind(wcag_contrast(tree.element(black).unwrap(), &strict)).is_none());
        let lax = RuleOptions::from_value(json!({ "minRatio": 3 }));
        assert!(kind(wcag_contrast(tree.element(grey).unwrap(), &lax)).is_none());

        let bad = RuleOptions::from_value(json!({ "minRatio": "high" }));
        assert!(matches!(wcag_contrast(tree.element(grey).unwrap(), &bad), Err(RuleError::Failed(_))));
    }

    #[test]
    fn test_contrast_same_colour() {
        let mut doc = Document::new("about:blank");
        let tree = doc.tree_mut();
        let invisible = with_text(tree, "span", &[("style", "color: white")], "ghost");
        let visible = with_text(tree, "span", &[], "text");

        let opts = RuleOptions::default();
        let tree = doc.tree();
        assert_eq!(kind(contrast(tree.element(invisible).unwrap(), &opts)).as_deref(), Some("low-contrast"));
        assert!(kind(contrast(tree.element(visible).unwrap(), &opts)).is_none());
    }

    #[test]
    fn test_input_label_variants() {
        let mut doc = Document::new("about:blank");
        let tree = doc.tree_mut();
        let labelled = element(tree, "input", &[("id", "foo")]);
        element(tree, "label", &[("for", "foo")]);
        let bare = element(tree, "input", &[("id", "bar")]);
        let aria = element(tree, "input", &[("aria-labelledby", "x")]);
        let wrapper = element(tree, "label", &[]);
        let wrapped = tree.create_element("input");
        tree.append_child(wrapper, wrapped).unwrap();

        let opts = RuleOptions::default();
        let tree = doc.tree();
        assert!(kind(input_label(tree.element(labelled).unwrap(), &opts)).is_none());
        assert_eq!(kind(input_label(tree.element(bare).unwrap(), &opts)).as_deref(), Some("missing-label"));
        assert!(kind(input_label(tree.element(aria).unwrap(), &opts)).is_none());
        assert!(kind(input_label(tree.element(wrapped).unwrap(), &opts)).is_none());
    }

    #[test]
    fn test_label_fix() {
        let mut doc = Document::new("about:blank");
        let tree = doc.tree_mut();
        let hinted = element(tree, "input", &[("placeholder", " Email ")]);
        let named = element(tree, "input", &[("name", "q")]);
        let bare = element(tree, "input", &[]);

        let opts = RuleOptions::default();
        label_input(&mut doc, hinted, &opts).unwrap();
        label_input(&mut doc, named, &opts).unwrap();
        assert_eq!(doc.element(hinted).unwrap().attr("aria-label"), Some("Email"));
        assert_eq!(doc.element(named).unwrap().attr("aria-label"), Some("q"));
        assert!(matches!(label_input(&mut doc, bare, &opts), Err(RuleError::Fix(_))));

        // Already labelled: nothing changes
        label_input(&mut doc, hinted, &opts).unwrap();
        assert_eq!(doc.element(hinted).unwrap().attr("aria-label"), Some("Email"));
    }

    #[test]
    fn test_aria_role() {
        let mut doc = Document::new("about:blank");
        let tree = doc.tree_mut();
        let known = element(tree, "div", &[("role", "button")]);
        let unknown = element(tree, "div", &[("role", "unknown")]);
        let blank = element(tree, "div", &[("role", " ")]);

        let opts = RuleOptions::default();
        let tree = doc.tree();
        assert!(kind(aria_role(tree.element(known).unwrap(), &opts)).is_none());
        let found = aria_role(tree.element(unknown).unwrap(), &opts).unwrap().unwrap();
        assert_eq!(found.kind, "unknown-aria-role");
        assert_eq!(found.message, "Unknown ARIA role: unknown");
        assert!(kind(aria_role(tree.element(blank).unwrap(), &opts)).is_none());
    }

    #[test]
    fn test_form_field() {
        let mut doc = Document::new("about:blank");
        let tree = doc.tree_mut();
        let empty = element(tree, "form", &[]);
        let filled = element(tree, "form", &[]);
        let fieldset = tree.create_element("fieldset");
        let select = tree.create_element("select");
        tree.append_child(filled, fieldset).unwrap();
        tree.append_child(fieldset, select).unwrap();

        let opts = RuleOptions::default();
        let tree = doc.tree();
        assert_eq!(kind(form_field(tree.element(empty).unwrap(), &opts)).as_deref(), Some("empty-form"));
        assert!(kind(form_field(tree.element(filled).unwrap(), &opts)).is_none());
    }

    #[test]
    fn test_registration_is_idempotent() {
        let registry = RuleRegistry::new();
        register_built_in_rules(&registry).unwrap();
        register_built_in_rules(&registry).unwrap();
        assert_eq!(registry.rule_ids(), BUILT_IN_RULE_IDS);
        assert!(registry.get("input-label").unwrap().supports_fix());
    }
}
