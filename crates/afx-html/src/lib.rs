//! AccessiFix HTML Parser
//!
//! HTML5 parsing built on html5ever. Produces an `afx_dom::Document`,
//! loading `<iframe srcdoc>` content as nested same-origin documents and
//! `<template shadowrootmode>` as declarative shadow roots.

mod parser;

pub use parser::HtmlParser;

use afx_dom::{Document, DomError};

/// Parse an HTML string into a document at `about:blank`
pub fn parse(html: &str) -> Document {
    HtmlParser::new().parse(html)
}

/// Result of parsing HTML
#[derive(Debug)]
pub struct ParseResult {
    pub document: Document,
    pub errors: Vec<ParseError>,
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("tree construction failed: {0}")]
    Tree(#[from] DomError),

    #[error("nested srcdoc documents exceed depth {limit}")]
    FrameDepth { limit: usize },
}
