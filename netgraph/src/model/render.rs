//! Values handed to the presentation layer.
//!
//! Everything here is plain data and serializes to stable snake_case JSON so
//! exporters can write it out unchanged.

use petgraph::graph::{Graph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::link::LinkKind;
use super::node::NodeId;

/// One line of an attribute inspector tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayNode {
    pub icon: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DisplayNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opened: Option<bool>,
}

impl DisplayNode {
    pub const FILE_ICON: &'static str = "jstree-file";

    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            icon: Self::FILE_ICON.to_string(),
            label: label.into(),
            children: Vec::new(),
            opened: None,
        }
    }

    /// Expanded subtree.
    pub fn branch(label: impl Into<String>, children: Vec<DisplayNode>) -> Self {
        Self {
            children,
            opened: Some(true),
            ..Self::leaf(label)
        }
    }

    pub fn opened(mut self, opened: bool) -> Self {
        self.opened = Some(opened);
        self
    }
}

/// Inspector payload for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectorNode {
    pub title: String,
    pub opened: bool,
    pub children: Vec<DisplayNode>,
}

/// Vertex as seen by a graph widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: NodeId,
    pub label: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    /// Hover text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    CurvedCw,
    CurvedCcw,
    CubicBezier,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeCurve {
    pub kind: CurveKind,
    pub roundness: f32,
}

/// Edge as seen by a graph widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEdge {
    pub id: u32,
    pub from: NodeId,
    pub to: NodeId,
    /// Link note, or empty.
    pub label: String,
    pub kind: LinkKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve: Option<EdgeCurve>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub dashes: bool,
}

/// Result of a draw query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderGraph {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl RenderGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Petgraph view for exporters. Edges whose endpoints are missing are skipped.
    pub fn to_petgraph(&self) -> Graph<RenderNode, RenderEdge> {
        let mut graph = Graph::with_capacity(self.nodes.len(), self.edges.len());
        let mut index: HashMap<NodeId, NodeIndex> = HashMap::with_capacity(self.nodes.len());

        for node in &self.nodes {
            let ix = graph.add_node(node.clone());
            index.insert(node.id, ix);
        }
        for edge in &self.edges {
            if let (Some(&a), Some(&b)) = (index.get(&edge.from), index.get(&edge.to)) {
                graph.add_edge(a, b, edge.clone());
            }
        }
        graph
    }
}
