//! Inline styles and computed style
//!
//! Styles come from the `style` attribute and a small set of user-agent
//! defaults; there are no stylesheets. `color`, `font-size` and
//! `font-weight` inherit (through shadow hosts too), everything else resets
//! per element.

use crate::color::Color;
use afx_dom::ElementRef;
use lightningcss::declaration::DeclarationBlock;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions};

/// Root font size used for `rem`
pub const ROOT_FONT_SIZE: f32 = 16.0;

/// A single `property: value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name
    pub property: String,
    /// Serialised value, without `!important`
    pub value: String,
    pub important: bool,
}

/// Declarations from a `style` attribute
///
/// Normal declarations come first in source order, then `!important` ones,
/// so the last match for a property is the one that applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<Declaration>,
}

impl InlineStyle {
    pub fn parse(text: &str) -> Self {
        let options = ParserOptions {
            error_recovery: true,
            ..ParserOptions::default()
        };
        let block = match DeclarationBlock::parse_string(text, options) {
            Ok(block) => block,
            Err(error) => {
                tracing::trace!(?error, "style attribute ignored");
                return Self::default();
            }
        };

        let normal = block.declarations.iter().map(|p| (p, false));
        let important = block.important_declarations.iter().map(|p| (p, true));
        let declarations = normal
            .chain(important)
            .filter_map(|(property, important)| {
                let value = property.value_to_css_string(PrinterOptions::default()).ok()?;
                let value = value.trim();
                if value.is_empty() {
                    return None;
                }
                Some(Declaration {
                    property: property.property_id().name().to_ascii_lowercase(),
                    value: value.to_string(),
                    important,
                })
            })
            .collect();
        Self { declarations }
    }

    /// Inline style of an element
    pub fn of(element: ElementRef<'_>) -> Self {
        element.attr("style").map(Self::parse).unwrap_or_default()
    }

    /// Value of `property`; the last declaration wins
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|d| d.property.eq_ignore_ascii_case(property))
            .map(|d| d.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// Display type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    None,
    #[default]
    Inline,
    Block,
    InlineBlock,
    Flex,
    Grid,
    Table,
    Contents,
    Other,
}

impl Display {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.trim().to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "inline" => Self::Inline,
            "block" => Self::Block,
            "inline-block" => Self::InlineBlock,
            "flex" | "inline-flex" => Self::Flex,
            "grid" | "inline-grid" => Self::Grid,
            "table" | "inline-table" => Self::Table,
            "contents" => Self::Contents,
            "" => return None,
            _ => Self::Other,
        })
    }

    /// User-agent default for a tag
    pub fn default_for(tag: &str) -> Self {
        match tag {
            "head" | "script" | "style" | "template" | "title" | "meta" | "link" => Self::None,
            "html" | "body" | "div" | "p" | "main" | "nav" | "header" | "footer" | "section"
            | "article" | "aside" | "form" | "fieldset" | "ul" | "ol" | "li" | "h1" | "h2"
            | "h3" | "h4" | "h5" | "h6" | "dialog" | "figure" | "blockquote" | "pre" => Self::Block,
            "table" => Self::Table,
            "button" | "input" | "select" | "textarea" | "img" => Self::InlineBlock,
            _ => Self::Inline,
        }
    }
}

/// Positioning scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl Position {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "static" => Some(Self::Static),
            "relative" => Some(Self::Relative),
            "absolute" => Some(Self::Absolute),
            "fixed" => Some(Self::Fixed),
            "sticky" => Some(Self::Sticky),
            _ => None,
        }
    }
}

const OUTLINE_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset", "auto",
];

/// Resolved style of one element
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub color: Color,
    pub background_color: Color,
    /// Font size in px
    pub font_size: f32,
    pub font_weight: u16,
    pub display: Display,
    pub position: Position,
    pub outline_style: String,
}

impl ComputedStyle {
    /// Initial values before any element is applied
    pub fn initial() -> Self {
        Self {
            color: Color::BLACK,
            background_color: Color::TRANSPARENT,
            font_size: ROOT_FONT_SIZE,
            font_weight: 400,
            display: Display::Inline,
            position: Position::Static,
            outline_style: "none".to_string(),
        }
    }

    /// Compute the style of `element`, cascading from its composed ancestors
    pub fn of(element: ElementRef<'_>) -> Self {
        composed_chain(element)
            .into_iter()
            .rev()
            .fold(Self::initial(), |parent, el| Self::cascade(el, &parent))
    }

    /// Apply `element`'s defaults and declarations on top of its parent's style
    pub fn cascade(element: ElementRef<'_>, parent: &ComputedStyle) -> Self {
        let mut style = Self {
            color: parent.color,
            font_size: parent.font_size,
            font_weight: parent.font_weight,
            display: default_display(element),
            ..Self::initial()
        };
        if matches!(element.tag_name(), "b" | "strong" | "th" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6") {
            style.font_weight = 700;
        }

        let inline = InlineStyle::of(element);
        for decl in inline.iter() {
            let value = decl.value.as_str();
            match decl.property.as_str() {
                "color" => {
                    if let Some(color) = resolve_color(value, parent.color) {
                        style.color = color;
                    }
                }
                "background-color" => {
                    if let Some(color) = resolve_color(value, style.color) {
                        style.background_color = color;
                    }
                }
                "background" => {
                    let color = resolve_color(value, style.color)
                        .or_else(|| value.split_whitespace().find_map(|t| resolve_color(t, style.color)));
                    if let Some(color) = color {
                        style.background_color = color;
                    }
                }
                "font-size" => {
                    if let Some(size) = parse_font_size(value, parent.font_size) {
                        style.font_size = size;
                    }
                }
                "font-weight" => {
                    if let Some(weight) = parse_font_weight(value, parent.font_weight) {
                        style.font_weight = weight;
                    }
                }
                "display" => {
                    if !element.has_attr("hidden") {
                        if let Some(display) = Display::parse(value) {
                            style.display = display;
                        }
                    }
                }
                "position" => {
                    if let Some(position) = Position::parse(value) {
                        style.position = position;
                    }
                }
                "outline-style" => {
                    let value = value.to_ascii_lowercase();
                    if OUTLINE_STYLES.contains(&value.as_str()) {
                        style.outline_style = value;
                    }
                }
                "outline" => style.outline_style = outline_shorthand_style(value),
                _ => {}
            }
        }
        style
    }

    /// Bold enough for the WCAG large-text allowance
    pub fn is_bold(&self) -> bool {
        self.font_weight >= 700
    }
}

/// `display` before inline declarations, honouring `hidden`
fn default_display(element: ElementRef<'_>) -> Display {
    let hidden_input = element.is("input")
        && element
            .attr("type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("hidden"));
    if element.has_attr("hidden") || hidden_input {
        Display::None
    } else {
        Display::default_for(element.tag_name())
    }
}

/// Computed `display` of a single element
pub fn display_of(element: ElementRef<'_>) -> Display {
    if element.has_attr("hidden") {
        return Display::None;
    }
    InlineStyle::of(element)
        .get("display")
        .and_then(Display::parse)
        .unwrap_or_else(|| default_display(element))
}

/// Computed `position` of a single element
pub fn position_of(element: ElementRef<'_>) -> Position {
    InlineStyle::of(element)
        .get("position")
        .and_then(Position::parse)
        .unwrap_or_default()
}

/// Background the element's text is drawn on
///
/// The element's and its composed ancestors' backgrounds composited over
/// an opaque white canvas.
pub fn effective_background(element: ElementRef<'_>) -> Color {
    let mut styles = Vec::new();
    let mut style = ComputedStyle::initial();
    for el in composed_chain(element).into_iter().rev() {
        style = ComputedStyle::cascade(el, &style);
        styles.push(style.background_color);
    }
    let mut layers = Vec::new();
    for background in styles.into_iter().rev() {
        if background.is_transparent() {
            continue;
        }
        layers.push(background);
        if background.is_opaque() {
            break;
        }
    }
    layers
        .into_iter()
        .rev()
        .fold(Color::WHITE, |backdrop, layer| layer.over(backdrop))
}

/// `element` followed by its composed ancestors
fn composed_chain(element: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut chain = vec![element];
    let mut cursor = element;
    while let Some(parent) = cursor.composed_parent() {
        chain.push(parent);
        cursor = parent;
    }
    chain
}

fn resolve_color(value: &str, current: Color) -> Option<Color> {
    match value.trim().to_ascii_lowercase().as_str() {
        "inherit" | "currentcolor" => Some(current),
        _ => Color::parse(value),
    }
}

/// The `outline-style` set by an `outline` shorthand (omitted means `none`)
pub fn outline_shorthand_style(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .find(|token| OUTLINE_STYLES.contains(&token.as_str()))
        .unwrap_or_else(|| "none".to_string())
}

/// Resolve a `font-size` value to px against the parent size
pub fn parse_font_size(value: &str, parent_px: f32) -> Option<f32> {
    let value = value.trim().to_ascii_lowercase();
    let keyword = match value.as_str() {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        "xxx-large" => Some(48.0),
        "smaller" => Some(parent_px / 1.2),
        "larger" => Some(parent_px * 1.2),
        "inherit" => Some(parent_px),
        _ => None,
    };
    if keyword.is_some() {
        return keyword;
    }
    let number = |s: &str| s.trim().parse::<f32>().ok().filter(|v| *v >= 0.0);
    let px = if let Some(v) = value.strip_suffix("rem") {
        number(v)? * ROOT_FONT_SIZE
    } else if let Some(v) = value.strip_suffix("px") {
        number(v)?
    } else if let Some(v) = value.strip_suffix("pt") {
        number(v)? * 4.0 / 3.0
    } else if let Some(v) = value.strip_suffix("em") {
        number(v)? * parent_px
    } else if let Some(v) = value.strip_suffix('%') {
        number(v)? * parent_px / 100.0
    } else if value == "0" {
        0.0
    } else {
        return None;
    };
    Some(px)
}

/// Resolve a `font-weight` value
pub fn parse_font_weight(value: &str, parent: u16) -> Option<u16> {
    match value.trim().to_ascii_lowercase().as_str() {
        "normal" => Some(400),
        "bold" => Some(700),
        "bolder" => Some(if parent < 600 { 700 } else { 900 }),
        "lighter" => Some(if parent > 500 { 400 } else { 100 }),
        "inherit" => Some(parent),
        other => other.parse::<u16>().ok().filter(|w| (1..=1000).contains(w)),
    }
}
