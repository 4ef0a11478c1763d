//! Phase 1: document → nodes.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::diagram::Diagram;
use crate::config::model::Limits;
use crate::core::summary::SummaryStopwatch;
use crate::document::{self, DocumentAdapter, ElementId};
use crate::error_handler::Result;
use crate::model::node::{ElementView, Node, NodeId, NodeKey};
use crate::model::style::StyleTable;
use crate::schema::{EntityRule, KeySource, SchemaTable};

/// Entry point: owns the compiled schema and style table, builds one
/// [`Diagram`] per [`parse`](Self::parse).
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    schema: Arc<SchemaTable>,
    styles: Arc<StyleTable>,
    limits: Limits,
}

impl GraphBuilder {
    pub fn new(schema: impl Into<Arc<SchemaTable>>) -> Self {
        Self {
            schema: schema.into(),
            styles: Arc::new(StyleTable::default()),
            limits: Limits::default(),
        }
    }

    pub fn with_styles(mut self, styles: impl Into<Arc<StyleTable>>) -> Self {
        self.styles = styles.into();
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn schema(&self) -> &Arc<SchemaTable> {
        &self.schema
    }

    pub fn styles(&self) -> &Arc<StyleTable> {
        &self.styles
    }

    /// Parse `raw` and run both phases.
    ///
    /// A malformed document fails before any node exists; everything after
    /// that (missing keys, unresolved pointers) is skipped, never an error.
    #[instrument(level = "debug", skip_all, fields(format = %self.schema.format(), bytes = raw.len()))]
    pub fn parse(&self, raw: &str) -> Result<Diagram> {
        let mut sw = SummaryStopwatch::start();

        let doc = document::load(raw, self.schema.format(), self.limits.max_document_bytes)?;
        sw.stop_parse_document();

        let built = self.build_nodes(doc);
        sw.stop_build_nodes();

        let mut diagram = built.resolve_links();
        sw.stop_resolve_links();
        diagram.timings = sw.into_timings();

        info!(
            nodes = diagram.node_count(),
            links = diagram.link_count(),
            total_ms = diagram.timings.total as u64,
            "diagram built"
        );
        Ok(diagram)
    }

    /// Phase 1 over an already parsed document.
    ///
    /// Top-level types are enumerated in table order under the document root;
    /// child rules are enumerated inside each accepted element. Ids follow
    /// pre-order: a node before everything it spawned.
    pub fn build_nodes(&self, doc: Box<dyn DocumentAdapter>) -> NodesBuilt {
        let mut state = Phase1 {
            schema: &self.schema,
            doc: doc.as_ref(),
            nodes: Vec::new(),
            by_type: IndexMap::new(),
        };

        let root = doc.root();
        for (type_name, rule) in self.schema.types() {
            state.by_type.entry(type_name.clone()).or_default();
            for element in doc.enumerate(root, type_name) {
                state.spawn(element, type_name, rule, None);
            }
        }

        let Phase1 { nodes, by_type, .. } = state;
        debug!(nodes = nodes.len(), types = by_type.len(), "nodes built");

        NodesBuilt {
            schema: Arc::clone(&self.schema),
            styles: Arc::clone(&self.styles),
            doc,
            nodes,
            by_type,
            generated_at: Utc::now(),
        }
    }
}

struct Phase1<'a> {
    schema: &'a SchemaTable,
    doc: &'a dyn DocumentAdapter,
    nodes: Vec<Node>,
    by_type: IndexMap<String, Vec<NodeId>>,
}

impl Phase1<'_> {
    fn spawn(&mut self, element: ElementId, type_name: &str, rule: &Arc<EntityRule>, parent: Option<NodeId>) {
        let view = ElementView::new(self.doc, element, type_name);
        let raw = self.raw_key(view, rule);
        let parsed = raw.as_deref().map(|r| NodeKey::parse(r, self.schema.key_parse()));
        let Some(key) = self.schema.node_class_for(rule).admit(view, parsed.clone()) else {
            debug!(type_name, element = view.name(), "element skipped: no key or vetoed");
            return;
        };
        // A class that rewrote the key also owns its text.
        let key_text = match (raw, parsed) {
            (Some(raw), Some(parsed)) if parsed == key => raw,
            _ => key.to_string(),
        };

        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::new(
            id,
            type_name.to_string(),
            key,
            key_text,
            element,
            parent,
            Arc::clone(rule),
        ));
        self.by_type.entry(type_name.to_string()).or_default().push(id);

        for (child_type, child_rule) in rule.children() {
            for child in self.doc.enumerate(element, child_type) {
                self.spawn(child, child_type, child_rule, Some(id));
            }
        }
    }

    fn raw_key(&self, view: ElementView<'_>, rule: &EntityRule) -> Option<String> {
        match self.schema.key_for(rule) {
            KeySource::Field(field) => self.doc.natural_key(view.element(), Some(field)),
            KeySource::ElementName => self.doc.natural_key(view.element(), None),
            KeySource::Fixed(value) => Some(value.clone()),
        }
    }
}

/// Every node exists; no link has been created yet.
#[derive(Debug)]
pub struct NodesBuilt {
    pub(super) schema: Arc<SchemaTable>,
    pub(super) styles: Arc<StyleTable>,
    pub(super) doc: Box<dyn DocumentAdapter>,
    pub(super) nodes: Vec<Node>,
    pub(super) by_type: IndexMap<String, Vec<NodeId>>,
    pub(super) generated_at: DateTime<Utc>,
}

impl NodesBuilt {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentFormat;
    use crate::error_handler::{DocumentError, NetGraphError};

    fn table() -> SchemaTable {
        SchemaTable::new(DocumentFormat::Xml)
            .with_key(KeySource::Field("id".into()))
            .with_entity(
                "card",
                EntityRule::new().with_child("port", EntityRule::new()),
            )
            .with_entity("fan", EntityRule::new())
    }

    #[test]
    fn ids_follow_pre_order_and_types_keep_first_seen_order() {
        let raw = r#"<dev>
            <card><id>1</id><port><id>10</id></port><port><id>11</id></port></card>
            <fan><id>7</id></fan>
            <card><id>2</id><port><id>20</id></port></card>
        </dev>"#;
        let diagram = GraphBuilder::new(table()).parse(raw).expect("parses");

        let order: Vec<(u32, &str, String)> = diagram
            .nodes()
            .iter()
            .map(|n| (n.id().get(), n.type_name(), n.key().to_string()))
            .collect();
        assert_eq!(
            order,
            vec![
                (1, "card", "1".to_string()),
                (2, "port", "10".to_string()),
                (3, "port", "11".to_string()),
                (4, "card", "2".to_string()),
                (5, "port", "20".to_string()),
                (6, "fan", "7".to_string()),
            ]
        );
        assert_eq!(diagram.type_names().collect::<Vec<_>>(), vec!["card", "port", "fan"]);
    }

    #[test]
    fn nodes_without_key_drop_their_subtree() {
        let schema = SchemaTable::new(DocumentFormat::Xml)
            .with_key(KeySource::Field("id".into()))
            .with_entity(
                "card",
                EntityRule::new().with_child(
                    "port",
                    EntityRule::new().with_key(KeySource::Field("pid".into())),
                ),
            );
        let raw = r#"<dev>
            <card><port><pid>10</pid></port></card>
            <card><id>2</id></card>
        </dev>"#;
        let built = GraphBuilder::new(schema)
            .build_nodes(document::load(raw, DocumentFormat::Xml, 0).expect("loads"));
        assert_eq!(built.node_count(), 1);
        assert_eq!(built.nodes()[0].key(), &NodeKey::from("2"));
    }

    #[test]
    fn malformed_documents_fail_the_parse() {
        let err = GraphBuilder::new(table()).parse("<dev><card>").expect_err("unclosed");
        assert!(matches!(err, NetGraphError::Document(DocumentError::Xml { .. })));
    }

    #[test]
    fn limits_apply_before_parsing() {
        let err = GraphBuilder::new(table())
            .with_limits(Limits {
                max_document_bytes: 8,
            })
            .parse("<dev><fan><id>1</id></fan></dev>")
            .expect_err("too large");
        assert!(matches!(err, NetGraphError::Document(DocumentError::TooLarge { .. })));
    }
}
