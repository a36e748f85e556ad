//! Focus Management
//!
//! Keyboard reachability of elements, following the HTML `tabIndex` rules.

use afx_dom::ElementRef;

/// Tab index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabIndex {
    /// Negative index: focusable by script only, skipped by Tab
    NotFocusable(i32),
    /// Zero or positive index: reachable in sequential navigation
    Sequential(i32),
}

impl TabIndex {
    /// Parse a `tabindex` attribute using the HTML integer rules
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim_start_matches([' ', '\t', '\n', '\x0C', '\r']);
        let (negative, digits) = match value.as_bytes().first() {
            Some(b'-') => (true, &value[1..]),
            Some(b'+') => (false, &value[1..]),
            _ => (false, value),
        };
        let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
        if end == 0 {
            return None;
        }
        let magnitude: i64 = digits[..end].parse().ok()?;
        let n = if negative { -magnitude } else { magnitude };
        let n = i32::try_from(n).ok()?;
        Some(Self::from_value(n))
    }

    pub fn from_value(n: i32) -> Self {
        if n < 0 { Self::NotFocusable(n) } else { Self::Sequential(n) }
    }

    /// Effective tab index of an element
    pub fn of(element: ElementRef<'_>) -> Self {
        if let Some(index) = element.attr("tabindex").and_then(Self::parse) {
            return index;
        }
        Self::from_value(if is_focusable_by_default(element) { 0 } else { -1 })
    }

    pub fn value(&self) -> i32 {
        match *self {
            Self::NotFocusable(n) | Self::Sequential(n) => n,
        }
    }

    pub fn is_sequential(&self) -> bool {
        matches!(self, Self::Sequential(_))
    }
}

fn is_focusable_by_default(element: ElementRef<'_>) -> bool {
    match element.tag_name() {
        "a" | "area" => element.has_attr("href"),
        "button" | "select" | "textarea" | "iframe" | "summary" => true,
        "input" => !element.attr("type").is_some_and(|t| t.trim().eq_ignore_ascii_case("hidden")),
        _ => element.has_attr("contenteditable"),
    }
}
