//! Directed, kind-tagged edges between nodes.
//!
//! Link kinds serialize to snake_case strings so exported artifacts stay
//! stable and grep-friendly.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use super::node::{Node, NodeId};
use super::render::RenderEdge;

/// Link label in the parent relation, seen from the child.
pub const PARENT_LABEL: &str = "parent";
/// Link label in the parent relation, seen from the parent.
pub const CHILD_LABEL: &str = "child";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LinkId(u32);

impl LinkId {
    pub fn get(self) -> u32 {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    pub(crate) fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Avoid renaming variants: they are part of exported artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Child → container.
    Parent,
    /// Declared pointer.
    #[default]
    Reference,
    Upstream,
    Downstream,
    Bidirectional,
}

impl LinkKind {
    pub const ALL: [LinkKind; 5] = [
        LinkKind::Parent,
        LinkKind::Reference,
        LinkKind::Upstream,
        LinkKind::Downstream,
        LinkKind::Bidirectional,
    ];
}

impl Display for LinkKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use LinkKind::*;
        let s = match self {
            Parent => "parent",
            Reference => "reference",
            Upstream => "upstream",
            Downstream => "downstream",
            Bidirectional => "bidirectional",
        };
        f.write_str(s)
    }
}

impl FromStr for LinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LinkKind::ALL
            .into_iter()
            .find(|k| k.to_string() == s.trim())
            .ok_or_else(|| format!("unknown link kind `{s}`"))
    }
}

/// Dedup identity of a link: ordered endpoints for directed kinds, unordered
/// for `bidirectional`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkIdentity {
    kind: LinkKind,
    a: NodeId,
    b: NodeId,
}

impl LinkIdentity {
    pub fn of(kind: LinkKind, from: NodeId, to: NodeId) -> Self {
        let (a, b) = if kind == LinkKind::Bidirectional && to < from {
            (to, from)
        } else {
            (from, to)
        };
        Self { kind, a, b }
    }
}

/// Presentational hints for links created by one entity rule.
pub trait LinkStyle: Send + Sync + fmt::Debug {
    fn decorate(&self, link: LinkView<'_>, out: &mut RenderEdge);
}

#[derive(Debug, Clone, Copy)]
pub struct LinkView<'a> {
    pub link: &'a Link,
    pub from: &'a Node,
    pub to: &'a Node,
}

#[derive(Debug, Clone)]
pub struct Link {
    pub(crate) id: LinkId,
    from: NodeId,
    to: NodeId,
    from_label: String,
    to_label: String,
    note: Option<String>,
    kind: LinkKind,
    style: Option<Arc<dyn LinkStyle>>,
}

impl Link {
    pub(crate) fn new(from: NodeId, to: NodeId, kind: LinkKind) -> Self {
        Self {
            id: LinkId::default(),
            from,
            to,
            from_label: String::new(),
            to_label: String::new(),
            note: None,
            kind,
            style: None,
        }
    }

    /// Ownership edge, always child → parent.
    pub(crate) fn parent(child: NodeId, parent: NodeId) -> Self {
        Self::new(child, parent, LinkKind::Parent).with_labels(PARENT_LABEL, CHILD_LABEL)
    }

    pub(crate) fn with_labels(mut self, from_label: impl Into<String>, to_label: impl Into<String>) -> Self {
        self.from_label = from_label.into();
        self.to_label = to_label.into();
        self
    }

    pub(crate) fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    pub(crate) fn with_style(mut self, style: Option<Arc<dyn LinkStyle>>) -> Self {
        self.style = style;
        self
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn from(&self) -> NodeId {
        self.from
    }

    pub fn to(&self) -> NodeId {
        self.to
    }

    pub fn from_label(&self) -> &str {
        &self.from_label
    }

    pub fn to_label(&self) -> &str {
        &self.to_label
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    pub fn identity(&self) -> LinkIdentity {
        LinkIdentity::of(self.kind, self.from, self.to)
    }

    /// The endpoint opposite to `node`, if `node` is an endpoint.
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if self.from == node {
            Some(self.to)
        } else if self.to == node {
            Some(self.from)
        } else {
            None
        }
    }

    pub fn draw(&self, from: &Node, to: &Node) -> RenderEdge {
        let mut out = RenderEdge {
            id: self.id.get(),
            from: self.from,
            to: self.to,
            label: self.note.clone().unwrap_or_default(),
            kind: self.kind,
            curve: None,
            color: None,
            dashes: false,
        };
        if let Some(style) = &self.style {
            style.decorate(LinkView { link: self, from, to }, &mut out);
        }
        out
    }
}
