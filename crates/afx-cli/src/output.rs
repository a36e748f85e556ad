//! Finding reports in text and JSON form

use afx_a11y::{Finding, FixReport};
use afx_dom::{Document, DomTree, NodeId};
use serde::Serialize;
use std::fmt::Write;

/// One finding with its element located by a CSS-like path
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry<'a> {
    #[serde(flatten)]
    pub finding: &'a Finding,
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<'a> {
    pub url: &'a str,
    pub findings: Vec<ReportEntry<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixes_applied: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fix_failures: Vec<String>,
}

impl<'a> Report<'a> {
    pub fn new(document: &'a Document, findings: &'a [Finding], fixes: Option<&FixReport>) -> Self {
        Self {
            url: document.url(),
            findings: findings
                .iter()
                .map(|finding| ReportEntry {
                    finding,
                    path: node_path(&document.tree, finding.node),
                })
                .collect(),
            fixes_applied: fixes.map(|r| r.applied.len()),
            fix_failures: fixes
                .map(|r| r.failures.iter().map(ToString::to_string).collect())
                .unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if let Some(applied) = self.fixes_applied {
            let _ = writeln!(out, "applied {applied} fix(es)");
        }
        for failure in &self.fix_failures {
            let _ = writeln!(out, "fix failed: {failure}");
        }
        for entry in &self.findings {
            let f = entry.finding;
            let _ = writeln!(
                out,
                "{:<7} {} [{}] {}: {}",
                f.severity, f.rule_id, f.kind, entry.path, f.message
            );
        }
        let _ = writeln!(out, "{} finding(s) in {}", self.findings.len(), self.url);
        out
    }
}

/// Separator written where a path enters a shadow tree
pub const SHADOW_SEPARATOR: &str = " >>> ";
/// Separator written where a path enters a frame's document
pub const FRAME_SEPARATOR: &str = " / ";

/// Selector-like path from the outermost tree root down to `node`
///
/// Steps use `#id` when present, otherwise `tag:nth-of-type(n)`. Each tree
/// scope gets its own segment, prefixed by the path of its shadow host or
/// frame element.
pub fn node_path(tree: &DomTree, node: NodeId) -> String {
    // Innermost scope first: (steps, separator before this scope)
    let mut scopes: Vec<(Vec<String>, &str)> = vec![(Vec::new(), "")];
    let mut current = Some(node);

    while let Some(id) = current {
        current = match tree.element(id) {
            Some(element) => {
                if let Some((steps, _)) = scopes.last_mut() {
                    steps.push(step(tree, id));
                }
                if element.attr("id").is_some_and(|v| !v.is_empty()) {
                    // Ids are unique per tree scope; jump to the scope root
                    Some(element.scope_root())
                } else {
                    tree.parent(id)
                }
            }
            None => {
                let outer = tree
                    .shadow_host(id)
                    .map(|host| (host, SHADOW_SEPARATOR))
                    .or_else(|| tree.frame_element(id).map(|frame| (frame, FRAME_SEPARATOR)));
                outer.map(|(owner, separator)| {
                    if let Some(scope) = scopes.last_mut() {
                        scope.1 = separator;
                    }
                    scopes.push((Vec::new(), ""));
                    owner
                })
            }
        };
    }

    let mut path = String::new();
    for (mut steps, separator) in scopes.into_iter().rev() {
        if steps.is_empty() {
            continue;
        }
        if !path.is_empty() {
            path.push_str(separator);
        }
        steps.reverse();
        path.push_str(&steps.join(" > "));
    }
    path
}

fn step(tree: &DomTree, id: NodeId) -> String {
    let Some(element) = tree.element(id) else {
        return String::new();
    };
    let tag = element.tag_name();
    if let Some(value) = element.attr("id").filter(|v| !v.is_empty()) {
        return format!("#{value}");
    }
    let Some(parent) = tree.parent(id) else {
        return tag.to_string();
    };
    let siblings: Vec<NodeId> = tree
        .children(parent)
        .filter(|&c| tree.element(c).is_some_and(|e| e.tag_name() == tag))
        .collect();
    if siblings.len() <= 1 {
        return tag.to_string();
    }
    let index = siblings.iter().position(|&c| c == id).map_or(1, |i| i + 1);
    format!("{tag}:nth-of-type({index})")
}
