//! Anchored subtree draw: reachability-limited rendering over the link graph.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use tracing::debug;

use super::diagram::Diagram;
use crate::model::link::LinkKind;
use crate::model::node::NodeId;
use crate::model::render::RenderGraph;

/// Destination types suppressed for one source type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvoidTarget {
    /// Written `"*"`.
    Any,
    One(String),
    Many(Vec<String>),
}

impl AvoidTarget {
    pub fn matches(&self, to_type: &str) -> bool {
        match self {
            Self::Any => true,
            Self::One(t) => t == to_type,
            Self::Many(ts) => ts.iter().any(|t| t == to_type),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AvoidTargetDef {
    One(String),
    Many(Vec<String>),
}

impl Serialize for AvoidTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let def = match self {
            Self::Any => AvoidTargetDef::One("*".to_string()),
            Self::One(t) => AvoidTargetDef::One(t.clone()),
            Self::Many(ts) => AvoidTargetDef::Many(ts.clone()),
        };
        def.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AvoidTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match AvoidTargetDef::deserialize(deserializer)? {
            AvoidTargetDef::One(t) if t.trim() == "*" => Self::Any,
            AvoidTargetDef::One(t) => Self::One(t),
            AvoidTargetDef::Many(ts) => Self::Many(ts),
        })
    }
}

/// Source type → suppressed destination types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvoidLinks(IndexMap<String, AvoidTarget>);

impl AvoidLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, from_type: impl Into<String>, target: AvoidTarget) -> Self {
        self.0.insert(from_type.into(), target);
        self
    }

    /// Whether traversal from `from_type` into `to_type` is suppressed.
    pub fn avoids(&self, from_type: &str, to_type: &str) -> bool {
        self.0.get(from_type).is_some_and(|t| t.matches(to_type))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, AvoidTarget)> for AvoidLinks {
    fn from_iter<T: IntoIterator<Item = (String, AvoidTarget)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Everything that limits an anchored draw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtreeFilter {
    /// Node types never entered.
    pub avoid_nodes: Vec<String>,
    pub avoid_links: AvoidLinks,
    /// Only these link kinds are drawn or followed; all when `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_kinds: Option<Vec<LinkKind>>,
}

impl SubtreeFilter {
    fn keeps_kind(&self, kind: LinkKind) -> bool {
        self.link_kinds.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }

    fn enters(&self, type_name: &str) -> bool {
        !self.avoid_nodes.iter().any(|t| t == type_name)
    }
}

impl Diagram {
    /// Render what is reachable from the anchor `(type_name, key)`.
    ///
    /// See [`draw_subtree_with`](Self::draw_subtree_with).
    pub fn draw_subtree(
        &self,
        type_name: &str,
        key: &str,
        excluded_types: &[&str],
        avoid_links: &AvoidLinks,
    ) -> RenderGraph {
        self.draw_subtree_with(
            type_name,
            key,
            &SubtreeFilter {
                avoid_nodes: excluded_types.iter().map(|t| t.to_string()).collect(),
                avoid_links: avoid_links.clone(),
                link_kinds: None,
            },
        )
    }

    /// Depth-first walk from the anchor over the link graph.
    ///
    /// Each node is emitted at most once, and excluded types are never
    /// entered. Outgoing links are drawn and followed; incoming links are
    /// followed but only drawn from their source side. A step from the
    /// current type into an avoided type is not taken, though the outgoing
    /// edge is still drawn. Edges whose other end never gets emitted are
    /// dropped at the end. An unknown anchor gives an empty graph.
    pub fn draw_subtree_with(&self, type_name: &str, key: &str, filter: &SubtreeFilter) -> RenderGraph {
        let mut out = RenderGraph::default();
        let Some(anchor) = self.find_anchor(type_name, key) else {
            debug!(type_name, key, "subtree anchor not found");
            return out;
        };
        if !filter.enters(anchor.type_name()) {
            return out;
        }

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut emitted = Vec::new();
        // (node, index of the next link to look at)
        let mut stack: Vec<(NodeId, usize)> = Vec::new();

        visited.insert(anchor.id());
        emitted.push(anchor.id());
        stack.push((anchor.id(), 0));

        while let Some(top) = stack.last_mut() {
            let (current_id, cursor) = *top;
            let Some(current) = self.node(current_id) else {
                stack.pop();
                continue;
            };
            let Some(&link_id) = current.links().get(cursor) else {
                stack.pop();
                continue;
            };
            top.1 += 1;

            let Some(link) = self.link(link_id) else {
                continue;
            };
            if !filter.keeps_kind(link.kind()) {
                continue;
            }

            let next_id = if link.from() == current_id {
                if let Some(edge) = self.draw_link(link) {
                    out.edges.push(edge);
                }
                link.to()
            } else {
                link.from()
            };

            if visited.contains(&next_id) {
                continue;
            }
            let Some(next) = self.node(next_id) else {
                continue;
            };
            if filter.avoid_links.avoids(current.type_name(), next.type_name())
                || !filter.enters(next.type_name())
            {
                continue;
            }

            visited.insert(next_id);
            emitted.push(next_id);
            stack.push((next_id, 0));
        }

        out.nodes = emitted.iter().filter_map(|&id| self.render_node(id)).collect();
        out.edges
            .retain(|e| visited.contains(&e.from) && visited.contains(&e.to));
        out
    }
}
