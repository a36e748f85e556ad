//! CSS Selectors
//!
//! Parsing and matching for the selector subset rules use to pick their
//! candidates: selector lists, compound selectors built from type,
//! universal, id, class and attribute components, and the descendant and
//! child combinators. Matching never leaves the element's tree scope.

use crate::SelectorError;
use afx_dom::{DomTree, ElementRef, NodeId};
use std::fmt;
use std::str::FromStr;

/// A component of a compound selector
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// Universal selector *
    Universal,
    /// Type selector (tag name)
    Type(String),
    /// ID selector #id
    Id(String),
    /// Class selector .class
    Class(String),
    /// Attribute selector [attr], [attr=value], etc.
    Attribute(AttributeSelector),
}

impl SelectorComponent {
    fn matches(&self, element: ElementRef<'_>) -> bool {
        match self {
            Self::Universal => true,
            Self::Type(tag) => element.is(tag),
            Self::Id(id) => element.attr("id") == Some(id.as_str()),
            Self::Class(class) => element.classes().any(|c| c == class),
            Self::Attribute(attr) => attr.matches(element.attr(&attr.name)),
        }
    }
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<AttributeMatcher>,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeMatcher {
    /// [attr=value] - exact match
    Exact(String),
    /// [attr~=value] - whitespace-separated list contains
    Contains(String),
    /// [attr|=value] - exact or prefix with hyphen
    DashMatch(String),
    /// [attr^=value] - starts with
    Prefix(String),
    /// [attr$=value] - ends with
    Suffix(String),
    /// [attr*=value] - contains substring
    Substring(String),
}

impl AttributeSelector {
    /// Check if an attribute value matches
    pub fn matches(&self, value: Option<&str>) -> bool {
        let (matcher, value) = match (&self.matcher, value) {
            (_, None) => return false,
            (None, Some(_)) => return true,
            (Some(matcher), Some(value)) => (matcher, value),
        };
        let fold = |s: &str| {
            if self.case_insensitive {
                s.to_lowercase()
            } else {
                s.to_string()
            }
        };
        let val = fold(value);
        match matcher {
            AttributeMatcher::Exact(expected) => val == fold(expected),
            AttributeMatcher::Contains(expected) => {
                let expected = fold(expected);
                !expected.is_empty() && val.split_ascii_whitespace().any(|w| w == expected)
            }
            AttributeMatcher::DashMatch(expected) => {
                let expected = fold(expected);
                val == expected || val.starts_with(&format!("{}-", expected))
            }
            AttributeMatcher::Prefix(expected) => !expected.is_empty() && val.starts_with(&fold(expected)),
            AttributeMatcher::Suffix(expected) => !expected.is_empty() && val.ends_with(&fold(expected)),
            AttributeMatcher::Substring(expected) => !expected.is_empty() && val.contains(&fold(expected)),
        }
    }
}

/// Combinator between two compound selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
}

/// Compound selector: components that must all match one element
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub components: Vec<SelectorComponent>,
}

impl Compound {
    pub fn matches(&self, element: ElementRef<'_>) -> bool {
        self.components.iter().all(|c| c.matches(element))
    }
}

/// Complex selector: compounds joined by combinators
///
/// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub compounds: Vec<Compound>,
    pub combinators: Vec<Combinator>,
}

impl Selector {
    /// Match right to left, starting from the subject compound
    pub fn matches(&self, element: ElementRef<'_>) -> bool {
        match self.compounds.len() {
            0 => false,
            n => self.matches_at(n - 1, element),
        }
    }

    fn matches_at(&self, index: usize, element: ElementRef<'_>) -> bool {
        if !self.compounds[index].matches(element) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => element
                .parent_element()
                .is_some_and(|parent| self.matches_at(index - 1, parent)),
            Combinator::Descendant => {
                let mut ancestor = element.parent_element();
                while let Some(current) = ancestor {
                    if self.matches_at(index - 1, current) {
                        return true;
                    }
                    ancestor = current.parent_element();
                }
                false
            }
        }
    }
}

/// Parsed selector list (`a, b`)
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    source: String,
    selectors: Vec<Selector>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let selectors = Parser::new(input).parse_list()?;
        Ok(Self {
            source: input.trim().to_string(),
            selectors,
        })
    }

    /// Selector text as written
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Whether any selector in the list matches `element`
    pub fn matches(&self, element: ElementRef<'_>) -> bool {
        self.selectors.iter().any(|s| s.matches(element))
    }

    /// Matching descendants of `scope` in document order
    ///
    /// Like `querySelectorAll`, `scope` itself is never returned and shadow
    /// roots and frame documents below it are not entered.
    pub fn query_all(&self, tree: &DomTree, scope: NodeId) -> Vec<NodeId> {
        tree.descendants(scope)
            .filter_map(|id| tree.element(id))
            .filter(|el| self.matches(*el))
            .map(|el| el.id())
            .collect()
    }

    /// First matching descendant of `scope`
    pub fn query(&self, tree: &DomTree, scope: NodeId) -> Option<NodeId> {
        tree.descendants(scope)
            .filter_map(|id| tree.element(id))
            .find(|el| self.matches(*el))
            .map(|el| el.id())
    }
}

impl FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse `selector` and collect its matches under `scope`
pub fn query_all(tree: &DomTree, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
    Ok(SelectorList::parse(selector)?.query_all(tree, scope))
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos != start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::UnexpectedChar { ch, pos: self.pos },
            None => SelectorError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        if self.peek() == Some(expected) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_list(&mut self) -> Result<Vec<Selector>, SelectorError> {
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(SelectorError::Empty);
        }
        let mut list = Vec::new();
        loop {
            self.skip_whitespace();
            list.push(self.parse_selector()?);
            self.skip_whitespace();
            match self.peek() {
                None => return Ok(list),
                Some(',') => {
                    self.bump();
                }
                Some(_) => return Err(self.unexpected()),
            }
        }
    }

    fn parse_selector(&mut self) -> Result<Selector, SelectorError> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some('+') | Some('~') => {
                    return Err(SelectorError::Unsupported("sibling combinators".into()));
                }
                Some(_) if had_space => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }
        Ok(Selector { compounds, combinators })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let mut components = Vec::new();
        loop {
            match self.peek() {
                Some('*') if components.is_empty() => {
                    self.bump();
                    components.push(SelectorComponent::Universal);
                }
                Some(c) if is_ident_start(c) && components.is_empty() => {
                    let name = self.parse_ident()?;
                    components.push(SelectorComponent::Type(name.to_ascii_lowercase()));
                }
                Some('#') => {
                    self.bump();
                    components.push(SelectorComponent::Id(self.parse_ident()?));
                }
                Some('.') => {
                    self.bump();
                    components.push(SelectorComponent::Class(self.parse_ident()?));
                }
                Some('[') => {
                    self.bump();
                    components.push(SelectorComponent::Attribute(self.parse_attribute()?));
                }
                Some(':') => return Err(SelectorError::Unsupported("pseudo-classes".into())),
                _ => break,
            }
        }
        if components.is_empty() {
            return Err(self.unexpected());
        }
        Ok(Compound { components })
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        if start == self.pos {
            return Err(self.unexpected());
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let operator = match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(AttributeSelector {
                    name,
                    matcher: None,
                    case_insensitive: false,
                });
            }
            Some('=') => None,
            Some(op @ ('~' | '|' | '^' | '$' | '*')) => {
                self.bump();
                Some(op)
            }
            _ => return Err(self.unexpected()),
        };
        self.expect('=')?;
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.bump();
                }
                let value = self.input[start..self.pos].to_string();
                self.expect(quote)?;
                value
            }
            _ => self.parse_ident()?,
        };
        self.skip_whitespace();
        let case_insensitive = match self.peek() {
            Some('i' | 'I') => {
                self.bump();
                true
            }
            Some('s' | 'S') => {
                self.bump();
                false
            }
            _ => false,
        };
        self.skip_whitespace();
        self.expect(']')?;

        let matcher = match operator {
            None => AttributeMatcher::Exact(value),
            Some('~') => AttributeMatcher::Contains(value),
            Some('|') => AttributeMatcher::DashMatch(value),
            Some('^') => AttributeMatcher::Prefix(value),
            Some('$') => AttributeMatcher::Suffix(value),
            _ => AttributeMatcher::Substring(value),
        };
        Ok(AttributeSelector {
            name,
            matcher: Some(matcher),
            case_insensitive,
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}
