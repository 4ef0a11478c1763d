//! A built diagram and its full-draw queries.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::resolve::{match_value, node_at};
use crate::core::summary::{BuildSummary, TimingsMs};
use crate::document::DocumentAdapter;
use crate::model::link::{Link, LinkId, LinkKind};
use crate::model::node::{Node, NodeId};
use crate::model::render::{InspectorNode, RenderEdge, RenderGraph, RenderNode};
use crate::model::style::StyleTable;
use crate::schema::{KeySource, ResolvedPointer, SchemaTable};

/// Filters for [`Diagram::draw_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawOptions {
    /// Node types left out of the result.
    pub excluded_types: Vec<String>,
    /// Only links of these kinds; every link when `None`.
    pub link_kinds: Option<Vec<LinkKind>>,
}

impl DrawOptions {
    pub(crate) fn keeps_kind(&self, kind: LinkKind) -> bool {
        self.link_kinds.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Nodes, links and the document they were built from.
///
/// Node and link ids are 1-based handles into the arenas. The parent of a
/// node and both ends of a link are ids, so the structure holds no cycles
/// even though the graph usually has them.
#[derive(Debug)]
pub struct Diagram {
    pub(crate) schema: Arc<SchemaTable>,
    pub(crate) styles: Arc<StyleTable>,
    pub(crate) doc: Box<dyn DocumentAdapter>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) by_type: IndexMap<String, Vec<NodeId>>,
    pub(crate) links: Vec<Link>,
    pub(crate) timings: TimingsMs,
    pub(crate) generated_at: DateTime<Utc>,
}

impl Diagram {
    pub fn schema(&self) -> &SchemaTable {
        &self.schema
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn document(&self) -> &dyn DocumentAdapter {
        self.doc.as_ref()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Every node, in id order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Every link, in id order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        node_at(&self.nodes, id)
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        id.index().and_then(|i| self.links.get(i))
    }

    /// Nodes of one type in list order; empty for unknown types.
    pub fn nodes_of_type<'a>(&'a self, type_name: &str) -> impl Iterator<Item = &'a Node> + use<'a> {
        self.by_type
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|&id| self.node(id))
    }

    /// Type names in index order: first seen, child types included.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }

    /// Links incident to `node`, in creation order.
    pub fn links_of(&self, node: NodeId) -> impl Iterator<Item = &Link> {
        self.node(node)
            .map(Node::links)
            .unwrap_or_default()
            .iter()
            .filter_map(|&id| self.link(id))
    }

    /// First node of `type_name` whose `field` (natural key when `None`)
    /// string-equals `value`.
    pub fn find_node(&self, type_name: &str, field: Option<&str>, value: &str) -> Option<&Node> {
        self.nodes_of_type(type_name)
            .find(|n| match_value(n, self.doc.as_ref(), field).as_deref() == Some(value))
    }

    /// Anchor lookup by the key the node's rule declares: the key field when
    /// the key comes from a field, the natural key otherwise.
    pub fn find_anchor(&self, type_name: &str, key: &str) -> Option<&Node> {
        self.nodes_of_type(type_name)
            .find(|n| self.anchor_key(n).as_deref() == Some(key))
    }

    /// Key under which `node` is found by [`find_anchor`](Self::find_anchor).
    pub fn anchor_key(&self, node: &Node) -> Option<String> {
        let field = match self.schema.key_for(node.rule()) {
            KeySource::Field(field) => Some(field.as_str()),
            KeySource::ElementName | KeySource::Fixed(_) => None,
        };
        match_value(node, self.doc.as_ref(), field)
    }

    pub fn render_node(&self, id: NodeId) -> Option<RenderNode> {
        self.node(id)
            .map(|n| n.draw(self.doc.as_ref(), &self.schema, &self.styles))
    }

    /// Inspector tree for one node.
    pub fn describe(&self, id: NodeId) -> Option<InspectorNode> {
        self.node(id)
            .map(|n| n.describe(self.doc.as_ref(), &self.schema, &self.styles))
    }

    pub fn link_specs(&self, id: NodeId) -> Vec<ResolvedPointer> {
        self.node(id)
            .map(|n| n.collect_link_specs(self.doc.as_ref()))
            .unwrap_or_default()
    }

    /// Every node whose type is not excluded, and every link.
    ///
    /// Links are not filtered by endpoint type; a widget ignores edges that
    /// reference undrawn ids.
    pub fn draw(&self, excluded_types: &[&str]) -> RenderGraph {
        self.draw_with(&DrawOptions {
            excluded_types: excluded_types.iter().map(|t| t.to_string()).collect(),
            link_kinds: None,
        })
    }

    pub fn draw_with(&self, options: &DrawOptions) -> RenderGraph {
        let nodes = self
            .by_type
            .iter()
            .filter(|(type_name, _)| !options.excluded_types.contains(*type_name))
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(|&id| self.render_node(id))
            .collect();

        let edges = self
            .links
            .iter()
            .filter(|l| options.keeps_kind(l.kind()))
            .filter_map(|l| self.draw_link(l))
            .collect();

        RenderGraph { nodes, edges }
    }

    pub(crate) fn draw_link(&self, link: &Link) -> Option<RenderEdge> {
        let from = self.node(link.from())?;
        let to = self.node(link.to())?;
        Some(link.draw(from, to))
    }

    /// Counts and timings of this parse.
    pub fn summary(&self) -> BuildSummary {
        BuildSummary::from_counts(self.schema.format(), self.generated_at, &self.nodes, &self.links)
            .with_timings(self.timings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentFormat;
    use crate::graph::builder::GraphBuilder;
    use crate::schema::{EntityRule, PointerSpec};
    use pretty_assertions::assert_eq;

    const RAW: &str = r#"<olt>
        <card><id>1</id><uplink>4</uplink></card>
        <card><id>2</id></card>
        <port><id>4</id><name>wan</name></port>
        <port><id>4</id><name>dup</name></port>
    </olt>"#;

    fn diagram() -> Diagram {
        let schema = SchemaTable::new(DocumentFormat::Xml)
            .with_key(KeySource::Field("id".into()))
            .with_entity(
                "card",
                EntityRule::new().with_link(PointerSpec::field("uplink", "port").with_to("id")),
            )
            .with_entity("port", EntityRule::new());
        GraphBuilder::new(schema).parse(RAW).expect("parses")
    }

    #[test]
    fn full_draw_emits_every_node_and_link() {
        let d = diagram();
        let g = d.draw(&[]);
        assert_eq!(g.nodes.len(), d.node_count());
        assert_eq!(g.edges.len(), d.link_count());
        assert_eq!(g.nodes[0].label, "card 1");
    }

    #[test]
    fn excluded_types_drop_nodes_but_keep_links() {
        let d = diagram();
        let g = d.draw(&["port"]);
        assert_eq!(g.nodes.len(), 2);
        assert_eq!(g.edges.len(), 1);

        let g = d.draw_with(&DrawOptions {
            excluded_types: vec![],
            link_kinds: Some(vec![LinkKind::Parent]),
        });
        assert_eq!(g.nodes.len(), 4);
        assert!(g.edges.is_empty());
    }

    #[test]
    fn duplicate_keys_resolve_to_the_first_node() {
        let d = diagram();
        let first_port = d.find_node("port", Some("id"), "4").expect("present");
        assert_eq!(first_port.id().get(), 3);
        assert_eq!(d.find_anchor("port", "4").map(Node::id), Some(first_port.id()));
        assert_eq!(d.links()[0].to(), first_port.id());
        assert!(d.find_node("port", Some("id"), "9").is_none());
        assert!(d.find_node("nope", None, "4").is_none());
    }

    #[test]
    fn describe_is_stable_across_calls() {
        let d = diagram();
        let id = d.nodes()[2].id();
        let first = d.describe(id).expect("exists");
        let second = d.describe(id).expect("exists");
        assert_eq!(first, second);
        assert_eq!(first.title, "port 4");
        assert_eq!(first.children.len(), 2);
    }

    #[test]
    fn summary_counts_by_type_and_kind() {
        let s = diagram().summary();
        assert_eq!(s.counts.nodes, 4);
        assert_eq!(s.counts.nodes_by_type["card"], 2);
        assert_eq!(s.counts.links_by_kind["reference"], 1);
    }
}
