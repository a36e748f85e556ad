//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts it to our arena DOM. Frame content is
//! loaded during conversion: `srcdoc` markup is parsed recursively into a
//! nested document sharing the parent's origin, and an `http(s)` `src` gets
//! an empty placeholder document carrying the target URL's origin.

use crate::{ParseError, ParseResult};
use afx_dom::{Document, DomTree, Node, NodeId, ShadowRootMode};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use url::Url;

/// Nested `srcdoc` documents deeper than this are not loaded
pub const DEFAULT_MAX_FRAME_DEPTH: usize = 8;

/// HTML5 parser
pub struct HtmlParser {
    max_frame_depth: usize,
}

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self {
            max_frame_depth: DEFAULT_MAX_FRAME_DEPTH,
        }
    }

    /// Limit how deeply `srcdoc` frames nest
    pub fn with_max_frame_depth(mut self, depth: usize) -> Self {
        self.max_frame_depth = depth;
        self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Document {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a base URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Document {
        let result = self.parse_detailed(html, url);
        for error in &result.errors {
            tracing::warn!(%url, %error, "HTML conversion error");
        }
        result.document
    }

    /// Parse HTML, returning conversion errors alongside the document
    pub fn parse_detailed(&self, html: &str, url: &str) -> ParseResult {
        tracing::debug!("Parsing HTML document: {}", url);

        let mut document = Document::empty(url);
        let mut builder = Builder {
            tree: document.tree_mut(),
            base: Url::parse(url).ok(),
            depth: 0,
            max_depth: self.max_frame_depth,
            errors: Vec::new(),
        };
        builder.load(html, NodeId::ROOT);
        let errors = builder.errors;

        tracing::debug!("Parsed {} nodes", document.tree().len());
        ParseResult { document, errors }
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts RcDom handles into one arena
struct Builder<'a> {
    tree: &'a mut DomTree,
    base: Option<Url>,
    depth: usize,
    max_depth: usize,
    errors: Vec<ParseError>,
}

impl Builder<'_> {
    /// Parse `html` into the (empty) document node `doc`
    fn load(&mut self, html: &str, doc: NodeId) {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        self.convert_children(&dom.document, doc, doc);
    }

    fn convert_children(&mut self, handle: &Handle, parent: NodeId, doc: NodeId) {
        for child in handle.children.borrow().iter() {
            self.convert_node(child, parent, doc);
        }
    }

    /// Convert an RcDom node to our DOM format
    fn convert_node(&mut self, handle: &Handle, parent: NodeId, doc: NodeId) {
        match &handle.data {
            RcNodeData::Document => self.convert_children(handle, parent, doc),
            RcNodeData::Text { contents } => {
                let text = contents.borrow();
                if !text.trim().is_empty() {
                    let id = self.tree.create_text(&text);
                    self.attach(parent, id);
                }
            }
            RcNodeData::Comment { contents } => {
                let id = self.tree.create_comment(contents);
                self.attach(parent, id);
            }
            RcNodeData::Element {
                name,
                attrs,
                template_contents,
                ..
            } => {
                let attrs: Vec<(String, String)> = attrs
                    .borrow()
                    .iter()
                    .map(|a| (a.name.local.to_string(), a.value.to_string()))
                    .collect();
                let pairs: Vec<(&str, &str)> = attrs.iter().map(|(n, v)| (n.as_str(), v.as_str())).collect();
                let local: &str = &name.local;

                if local == "template" {
                    let contents = template_contents.borrow();
                    if let (Some(contents), Some(mode)) = (contents.as_ref(), shadow_mode(&pairs)) {
                        if self.attach_declarative_shadow(contents, parent, mode, doc) {
                            return;
                        }
                    }
                }

                let id = self.tree.create_element_with_attrs(local, &pairs);
                self.attach(parent, id);
                // Template contents are inert and stay out of the tree
                self.convert_children(handle, id, doc);

                if local == "iframe" || local == "frame" {
                    self.load_frame(id, &pairs, doc);
                }
            }
            RcNodeData::Doctype { .. } | RcNodeData::ProcessingInstruction { .. } => {}
        }
    }

    /// Turn `<template shadowrootmode>` into a shadow root on `host`
    fn attach_declarative_shadow(&mut self, contents: &Handle, host: NodeId, mode: ShadowRootMode, doc: NodeId) -> bool {
        if self.tree.element(host).is_none() {
            return false;
        }
        match self.tree.attach_declarative_shadow(host, mode) {
            Ok(shadow) => {
                self.convert_children(contents, shadow, doc);
                true
            }
            Err(err) => {
                tracing::trace!(%host, %err, "declarative shadow root ignored");
                false
            }
        }
    }

    fn load_frame(&mut self, frame: NodeId, attrs: &[(&str, &str)], doc: NodeId) {
        if let Some(markup) = attr(attrs, "srcdoc") {
            if self.depth >= self.max_depth {
                self.errors.push(ParseError::FrameDepth { limit: self.max_depth });
                return;
            }
            let origin = self
                .tree
                .get(doc)
                .and_then(Node::as_document)
                .map(|d| d.origin.clone());
            let nested = self.tree.create_document("about:srcdoc", origin);
            self.depth += 1;
            self.load(markup, nested);
            self.depth -= 1;
            self.set_frame_document(frame, nested);
        } else if let Some(src) = attr(attrs, "src") {
            let target = match &self.base {
                Some(base) => base.join(src).ok(),
                None => Url::parse(src).ok(),
            };
            let Some(target) = target.filter(|u| matches!(u.scheme(), "http" | "https")) else {
                return;
            };
            // Remote content is never fetched; the document only carries its origin
            let nested = self.tree.create_document(target.as_str(), None);
            self.set_frame_document(frame, nested);
        }
    }

    fn set_frame_document(&mut self, frame: NodeId, doc: NodeId) {
        if let Err(err) = self.tree.set_frame_document(frame, doc) {
            self.errors.push(err.into());
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Err(err) = self.tree.append_child(parent, child) {
            self.errors.push(err.into());
        }
    }
}

fn attr<'a>(attrs: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    attrs.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

fn shadow_mode(attrs: &[(&str, &str)]) -> Option<ShadowRootMode> {
    attr(attrs, "shadowrootmode").and_then(ShadowRootMode::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
        let doc = HtmlParser::new().parse(html);

        assert_eq!(doc.title(), "Test");
        let body = doc.body().unwrap();
        let p = doc.tree.children(body).next().unwrap();
        assert_eq!(doc.element(p).unwrap().text_content(), "Hello");
    }

    #[test]
    fn test_parse_fragment() {
        let html = "<div><span>Text</span></div>";
        let doc = HtmlParser::new().parse(html);

        // Even fragments get wrapped in html/head/body by html5ever
        assert!(doc.body().is_some());
        assert!(doc.head().is_some());
    }

    #[test]
    fn test_attribute_lookup() {
        let doc = HtmlParser::new().parse(r#"<input ID="name" Placeholder="Your name">"#);
        let input = doc.get_element_by_id("name").unwrap();
        assert_eq!(doc.element(input).unwrap().attr("placeholder"), Some("Your name"));
    }
}
