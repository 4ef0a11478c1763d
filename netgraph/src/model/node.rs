//! Typed graph vertices.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::attribute::{Attribute, FieldSource};
use super::link::LinkId;
use super::render::{InspectorNode, RenderNode};
use super::style::{NodeStyle, StyleTable};
use crate::document::{DocumentAdapter, ElementId};
use crate::schema::pointer::{ResolvedPointer, collect_pointers};
use crate::schema::{EntityRule, KeyParse, SchemaTable};

/// Sequential node id, starting at 1 within one parse.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// `None` for 0, which is never assigned.
    pub fn new(raw: u32) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

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

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Natural key of a node, unique per type only by convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeKey {
    Int(i64),
    Text(String),
}

impl NodeKey {
    /// Integer mode keeps the raw text when it does not parse as `i64`.
    pub fn parse(raw: &str, mode: KeyParse) -> Self {
        match mode {
            KeyParse::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Self::Int)
                .unwrap_or_else(|_| Self::Text(raw.to_string())),
            KeyParse::Text => Self::Text(raw.to_string()),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for NodeKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for NodeKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// A document element about to become (or already backing) a node.
#[derive(Clone, Copy)]
pub struct ElementView<'a> {
    doc: &'a dyn DocumentAdapter,
    element: ElementId,
    type_name: &'a str,
}

impl<'a> ElementView<'a> {
    pub fn new(doc: &'a dyn DocumentAdapter, element: ElementId, type_name: &'a str) -> Self {
        Self {
            doc,
            element,
            type_name,
        }
    }

    pub fn type_name(&self) -> &'a str {
        self.type_name
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn document(&self) -> &'a dyn DocumentAdapter {
        self.doc
    }

    /// Element tag or member name.
    pub fn name(&self) -> &'a str {
        self.doc.name(self.element)
    }

    /// First value found at `path`.
    pub fn field(&self, path: &str) -> Option<String> {
        self.doc.first_value(self.element, path)
    }

    /// Every value found at `path`, in document order.
    pub fn values(&self, path: &str) -> Vec<String> {
        self.doc.scalar_or_list(self.element, path).into_vec()
    }

    pub fn child_count(&self) -> usize {
        self.doc.child_count(self.element)
    }

    pub fn as_field(&self) -> FieldSource<'a> {
        FieldSource::new(self.doc, self.element)
    }
}

impl fmt::Debug for ElementView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementView")
            .field("type_name", &self.type_name)
            .field("element", &self.element)
            .finish()
    }
}

/// A registered node together with what it needs for presentation.
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    node: &'a Node,
    doc: &'a dyn DocumentAdapter,
    style: Option<&'a NodeStyle>,
}

impl<'a> NodeView<'a> {
    pub fn new(node: &'a Node, doc: &'a dyn DocumentAdapter, style: Option<&'a NodeStyle>) -> Self {
        Self { node, doc, style }
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn type_name(&self) -> &'a str {
        &self.node.type_name
    }

    pub fn key(&self) -> &'a NodeKey {
        &self.node.key
    }

    pub fn style(&self) -> Option<&'a NodeStyle> {
        self.style
    }

    pub fn link_count(&self) -> usize {
        self.node.links.len()
    }

    pub fn element(&self) -> ElementView<'a> {
        ElementView::new(self.doc, self.node.element, &self.node.type_name)
    }

    pub fn field(&self, path: &str) -> Option<String> {
        self.element().field(path)
    }

    /// `"<display name or type> <key>"`.
    pub fn default_display_name(&self) -> String {
        let name = self
            .style
            .and_then(|s| s.display_name.as_deref())
            .unwrap_or(&self.node.type_name);
        format!("{name} {}", self.node.key)
    }
}

/// Per-type node behaviour.
pub trait NodeClass: Send + Sync + fmt::Debug {
    /// Accept an element with its derived key, possibly rewriting the key.
    /// `None` discards the element and everything it would spawn.
    fn admit(&self, _element: ElementView<'_>, key: Option<NodeKey>) -> Option<NodeKey> {
        key
    }

    fn display_name(&self, node: NodeView<'_>) -> String {
        node.default_display_name()
    }

    /// Base presentation, applied before the style entry.
    fn defaults(&self, _out: &mut RenderNode) {}

    /// Final touches, applied after the style entry.
    fn decorate(&self, _node: NodeView<'_>, _out: &mut RenderNode) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNodeClass;

impl NodeClass for DefaultNodeClass {}

#[derive(Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    type_name: String,
    key: NodeKey,
    key_text: String,
    element: ElementId,
    parent: Option<NodeId>,
    pub(crate) links: Vec<LinkId>,
    rule: Arc<EntityRule>,
    attributes: OnceLock<Vec<Attribute>>,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        type_name: String,
        key: NodeKey,
        key_text: String,
        element: ElementId,
        parent: Option<NodeId>,
        rule: Arc<EntityRule>,
    ) -> Self {
        Self {
            id,
            type_name,
            key,
            key_text,
            element,
            parent,
            links: Vec::new(),
            rule,
            attributes: OnceLock::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    /// Key as written in the document, before integer parsing.
    pub fn key_text(&self) -> &str {
        &self.key_text
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Incident links in creation order.
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    pub fn rule(&self) -> &Arc<EntityRule> {
        &self.rule
    }

    /// Attribute list, built on first use and cached.
    pub fn attributes(&self, doc: &dyn DocumentAdapter, schema: &SchemaTable) -> &[Attribute] {
        self.attributes.get_or_init(|| {
            let default = schema.default_renderer();
            FieldSource::new(doc, self.element)
                .children()
                .map(|field| Attribute::resolve(field, self.rule.attributes(), default))
                .collect()
        })
    }

    /// Inspector tree; attributes are re-rendered on every call.
    pub fn describe(
        &self,
        doc: &dyn DocumentAdapter,
        schema: &SchemaTable,
        styles: &StyleTable,
    ) -> InspectorNode {
        let view = NodeView::new(self, doc, styles.get(&self.type_name));
        let title = schema.node_class_for(&self.rule).display_name(view);
        let children = self
            .attributes(doc, schema)
            .iter()
            .filter_map(|attr| attr.render(doc))
            .collect();
        InspectorNode {
            title,
            opened: true,
            children,
        }
    }

    pub fn draw(
        &self,
        doc: &dyn DocumentAdapter,
        schema: &SchemaTable,
        styles: &StyleTable,
    ) -> RenderNode {
        let style = styles.get(&self.type_name);
        let view = NodeView::new(self, doc, style);
        let class = schema.node_class_for(&self.rule);

        let mut out = RenderNode {
            id: self.id,
            label: class.display_name(view),
            type_name: self.type_name.clone(),
            ..RenderNode::default()
        };
        class.defaults(&mut out);
        if let Some(style) = style {
            style.apply(&mut out);
        }
        class.decorate(view, &mut out);
        out
    }

    /// Pointer descriptors evaluated against this node's element.
    pub fn collect_link_specs(&self, doc: &dyn DocumentAdapter) -> Vec<ResolvedPointer> {
        let mut out = Vec::new();
        if !self.rule.links().is_empty() {
            let view = ElementView::new(doc, self.element, &self.type_name);
            collect_pointers(self.rule.links(), view, &mut out);
        }
        out
    }
}
