//! AccessiFix CSS
//!
//! The style facts accessibility rules need: selector matching for
//! candidate lookup, inline-style cascade into a computed style, WCAG
//! colour contrast, and whether an element is rendered at all.

mod color;
mod selectors;
mod style;
mod visibility;

pub use color::{Color, ContrastChecker};
pub use selectors::{
    query_all, AttributeMatcher, AttributeSelector, Combinator, Compound, Selector, SelectorComponent,
    SelectorList,
};
pub use style::{
    display_of, effective_background, outline_shorthand_style, parse_font_size, parse_font_weight, position_of,
    ComputedStyle, Declaration, Display, InlineStyle, Position, ROOT_FONT_SIZE,
};
pub use visibility::{is_rendered, VisibilityState};

/// Selector parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unexpected '{ch}' at offset {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected end of selector")]
    UnexpectedEnd,

    #[error("unsupported selector syntax: {0}")]
    Unsupported(String),
}
