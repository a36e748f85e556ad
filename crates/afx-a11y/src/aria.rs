//! ARIA Support
//!
//! Concrete WAI-ARIA 1.2 roles. Abstract roles (`widget`, `landmark`,
//! `structure`, ...) are not valid in a `role` attribute and do not parse.

use std::fmt;

macro_rules! aria_roles {
    ($($variant:ident => $name:literal,)*) => {
        /// ARIA role
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum AriaRole {
            $($variant,)*
        }

        impl AriaRole {
            /// Every concrete role, in alphabetical order
            pub const ALL: &'static [AriaRole] = &[$(Self::$variant,)*];

            /// Parse a single role token (ASCII case-insensitive)
            pub fn parse(s: &str) -> Option<Self> {
                let token = s.trim().to_ascii_lowercase();
                Some(match token.as_str() {
                    $($name => Self::$variant,)*
                    _ => return None,
                })
            }

            /// Canonical attribute value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }
        }
    };
}

aria_roles! {
    Alert => "alert",
    AlertDialog => "alertdialog",
    Application => "application",
    Article => "article",
    Banner => "banner",
    Blockquote => "blockquote",
    Button => "button",
    Caption => "caption",
    Cell => "cell",
    Checkbox => "checkbox",
    Code => "code",
    ColumnHeader => "columnheader",
    ComboBox => "combobox",
    Complementary => "complementary",
    ContentInfo => "contentinfo",
    Definition => "definition",
    Deletion => "deletion",
    Dialog => "dialog",
    Directory => "directory",
    Document => "document",
    Emphasis => "emphasis",
    Feed => "feed",
    Figure => "figure",
    Form => "form",
    Generic => "generic",
    Grid => "grid",
    GridCell => "gridcell",
    Group => "group",
    Heading => "heading",
    Img => "img",
    Insertion => "insertion",
    Link => "link",
    List => "list",
    ListBox => "listbox",
    ListItem => "listitem",
    Log => "log",
    Main => "main",
    Marquee => "marquee",
    Math => "math",
    Menu => "menu",
    MenuBar => "menubar",
    MenuItem => "menuitem",
    MenuItemCheckbox => "menuitemcheckbox",
    MenuItemRadio => "menuitemradio",
    Meter => "meter",
    Navigation => "navigation",
    None => "none",
    Note => "note",
    Option => "option",
    Paragraph => "paragraph",
    Presentation => "presentation",
    ProgressBar => "progressbar",
    Radio => "radio",
    RadioGroup => "radiogroup",
    Region => "region",
    Row => "row",
    RowGroup => "rowgroup",
    RowHeader => "rowheader",
    ScrollBar => "scrollbar",
    Search => "search",
    SearchBox => "searchbox",
    Separator => "separator",
    Slider => "slider",
    SpinButton => "spinbutton",
    Status => "status",
    Strong => "strong",
    Subscript => "subscript",
    Superscript => "superscript",
    Switch => "switch",
    Tab => "tab",
    Table => "table",
    TabList => "tablist",
    TabPanel => "tabpanel",
    Term => "term",
    TextBox => "textbox",
    Time => "time",
    Timer => "timer",
    Toolbar => "toolbar",
    ToolTip => "tooltip",
    Tree => "tree",
    TreeGrid => "treegrid",
    TreeItem => "treeitem",
}

impl AriaRole {
    /// Check if role is landmark
    pub fn is_landmark(&self) -> bool {
        matches!(
            self,
            Self::Banner
                | Self::Complementary
                | Self::ContentInfo
                | Self::Form
                | Self::Main
                | Self::Navigation
                | Self::Region
                | Self::Search
        )
    }

    /// Check if role is widget
    pub fn is_widget(&self) -> bool {
        matches!(
            self,
            Self::Button
                | Self::Checkbox
                | Self::ComboBox
                | Self::GridCell
                | Self::Link
                | Self::ListBox
                | Self::Menu
                | Self::MenuItem
                | Self::MenuItemCheckbox
                | Self::MenuItemRadio
                | Self::Option
                | Self::Radio
                | Self::ScrollBar
                | Self::SearchBox
                | Self::Slider
                | Self::SpinButton
                | Self::Switch
                | Self::Tab
                | Self::TextBox
                | Self::TreeItem
        )
    }

    /// First recognised token of a space-separated `role` value
    pub fn from_attribute(value: &str) -> Option<Self> {
        value.split_ascii_whitespace().find_map(Self::parse)
    }
}

impl fmt::Display for AriaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_every_role() {
        for role in AriaRole::ALL {
            assert_eq!(AriaRole::parse(role.as_str()), Some(*role));
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(AriaRole::parse("Navigation"), Some(AriaRole::Navigation));
        assert_eq!(AriaRole::parse(" BUTTON "), Some(AriaRole::Button));
    }

    #[test]
    fn test_abstract_and_unknown_roles() {
        assert_eq!(AriaRole::parse("widget"), None);
        assert_eq!(AriaRole::parse("landmark"), None);
        assert_eq!(AriaRole::parse("buton"), None);
        assert_eq!(AriaRole::parse(""), None);
    }

    #[test]
    fn test_fallback_tokens() {
        assert_eq!(AriaRole::from_attribute("fancy switch"), Some(AriaRole::Switch));
        assert_eq!(AriaRole::from_attribute("fancy"), None);
    }

    #[test]
    fn test_categories() {
        assert!(AriaRole::Main.is_landmark());
        assert!(AriaRole::Search.is_landmark());
        assert!(!AriaRole::Button.is_landmark());
        assert!(AriaRole::Button.is_widget());
        assert!(!AriaRole::Heading.is_widget());
    }
}
