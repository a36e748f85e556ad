//! Shadow DOM
//!
//! Shadow roots are separate tree scopes attached to a host element. Only
//! open roots are visible to traversal; closed roots exist in the arena but
//! are never handed out by `DomTree::open_shadow_root`.

use crate::NodeId;

/// Shadow root mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowRootMode {
    #[default]
    Open,
    Closed,
}

impl ShadowRootMode {
    /// Parse a `shadowrootmode` attribute value
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Shadow root data stored in the arena
#[derive(Debug, Clone)]
pub struct ShadowRootData {
    /// Host element
    pub host: NodeId,
    /// Mode (open/closed)
    pub mode: ShadowRootMode,
    /// Whether this came from declarative shadow DOM
    pub declarative: bool,
}

impl ShadowRootData {
    pub fn new(host: NodeId, mode: ShadowRootMode) -> Self {
        Self {
            host,
            mode,
            declarative: false,
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.mode == ShadowRootMode::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!(ShadowRootMode::parse("open"), Some(ShadowRootMode::Open));
        assert_eq!(ShadowRootMode::parse(" Closed "), Some(ShadowRootMode::Closed));
        assert_eq!(ShadowRootMode::parse("sideways"), None);
    }
}
