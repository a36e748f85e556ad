//! Rendered visibility
//!
//! Stand-in for the `offsetParent === null` test: an element has no offset
//! parent when it is not rendered, is fixed-position, is the root or body
//! element, or is not attached to a document.

use crate::style::{display_of, position_of, Display, Position};
use afx_dom::ElementRef;

/// Why an element does (or does not) take part in layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityState {
    /// Rendered with an offset parent
    #[default]
    Rendered,

    /// The element or a composed ancestor has `display: none`
    DisplayNone,

    /// `position: fixed` elements have no offset parent
    Fixed,

    /// `<html>` and `<body>`
    RootElement,

    /// Not connected to any document
    Detached,
}

impl VisibilityState {
    pub fn of(element: ElementRef<'_>) -> Self {
        if !element.tree().is_connected(element.id()) {
            return Self::Detached;
        }
        if element.is("html") || element.is("body") {
            return Self::RootElement;
        }
        let mut cursor = Some(element);
        while let Some(el) = cursor {
            if display_of(el) == Display::None {
                return Self::DisplayNone;
            }
            cursor = el.composed_parent();
        }
        if position_of(element) == Position::Fixed {
            return Self::Fixed;
        }
        Self::Rendered
    }

    /// Whether the element would report an offset parent
    #[inline]
    pub fn has_offset_parent(&self) -> bool {
        matches!(self, Self::Rendered)
    }
}

/// Whether `element` passes the rendered-visibility filter
pub fn is_rendered(element: ElementRef<'_>) -> bool {
    let state = VisibilityState::of(element);
    if !state.has_offset_parent() {
        tracing::trace!(element = %element.id(), ?state, "not rendered");
    }
    state.has_offset_parent()
}

#[cfg(test)]
mod tests {
    use super::*;
    use afx_dom::{Document, NodeId, ShadowRootMode};

    fn add(doc: &mut Document, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = doc.tree.create_element_with_attrs(tag, attrs);
        doc.tree.append_child(parent, id).unwrap();
        id
    }

    #[test]
    fn test_visibility_states() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let shown = add(&mut doc, body, "p", &[]);
        let hidden_parent = add(&mut doc, body, "div", &[("style", "display: none")]);
        let hidden_child = add(&mut doc, hidden_parent, "button", &[]);
        let fixed = add(&mut doc, body, "nav", &[("style", "position: fixed")]);
        let attr_hidden = add(&mut doc, body, "span", &[("hidden", "")]);
        let detached = doc.tree.create_element("div");

        let state = |id: NodeId| VisibilityState::of(doc.element(id).unwrap());
        assert_eq!(state(shown), VisibilityState::Rendered);
        assert_eq!(state(hidden_child), VisibilityState::DisplayNone);
        assert_eq!(state(fixed), VisibilityState::Fixed);
        assert_eq!(state(attr_hidden), VisibilityState::DisplayNone);
        assert_eq!(state(detached), VisibilityState::Detached);
        assert_eq!(state(body), VisibilityState::RootElement);
        assert!(is_rendered(doc.element(shown).unwrap()));
        assert!(!is_rendered(doc.element(fixed).unwrap()));
    }

    #[test]
    fn test_hidden_shadow_host_hides_shadow_content() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let host = add(&mut doc, body, "div", &[("hidden", "")]);
        let shadow = doc.tree.attach_shadow(host, ShadowRootMode::Open).unwrap();
        let inner = add(&mut doc, shadow, "input", &[]);

        assert_eq!(VisibilityState::of(doc.element(inner).unwrap()), VisibilityState::DisplayNone);
    }
}
