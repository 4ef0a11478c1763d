//! Attribute rendering.
//!
//! An [`Attribute`] is one direct child field of a node's element paired with
//! the [`AttributeRenderer`] that turns it into a [`DisplayNode`] tree.
//! Renderers are chosen per attribute name by the entity rule's overrides,
//! falling back to the schema's default renderer.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use super::render::DisplayNode;
use crate::decode::hex_to_ascii;
use crate::document::{DocumentAdapter, ElementId};

/// One field of a document, borrowed for rendering.
#[derive(Clone, Copy)]
pub struct FieldSource<'a> {
    doc: &'a dyn DocumentAdapter,
    element: ElementId,
}

impl<'a> FieldSource<'a> {
    pub fn new(doc: &'a dyn DocumentAdapter, element: ElementId) -> Self {
        Self { doc, element }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn name(&self) -> &'a str {
        self.doc.name(self.element)
    }

    pub fn text(&self) -> Option<String> {
        self.doc.text(self.element)
    }

    /// Trimmed text, or empty when the value has none.
    pub fn value(&self) -> String {
        self.text().unwrap_or_default()
    }

    pub fn is_composite(&self) -> bool {
        self.doc.child_count(self.element) > 0
    }

    pub fn children(self) -> impl Iterator<Item = FieldSource<'a>> {
        let doc = self.doc;
        doc.children(self.element)
            .into_iter()
            .map(move |element| FieldSource { doc, element })
    }

    pub fn child(&self, name: &str) -> Option<FieldSource<'a>> {
        self.children().find(|c| c.name() == name)
    }

    pub fn prop(&self, name: &str) -> Option<&'a str> {
        self.doc.prop(self.element, name)
    }
}

impl fmt::Debug for FieldSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSource")
            .field("name", &self.name())
            .field("element", &self.element)
            .finish()
    }
}

/// Strategy turning one field into a display tree.
///
/// `None` omits the attribute from the inspector.
pub trait AttributeRenderer: Send + Sync + fmt::Debug {
    fn render(&self, field: FieldSource<'_>, nested: Option<&AttrOverrides>) -> Option<DisplayNode>;
}

/// Per-attribute override: a renderer, or a nested table for composite values.
#[derive(Debug, Clone)]
pub enum AttrOverride {
    Renderer(Arc<dyn AttributeRenderer>),
    Nested(AttrOverrides),
}

/// Ordered attribute-name → override table.
#[derive(Debug, Clone, Default)]
pub struct AttrOverrides {
    entries: IndexMap<String, AttrOverride>,
}

impl AttrOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: AttrOverride) -> Self {
        self.entries.insert(name.into(), value);
        self
    }

    pub fn with_renderer(self, name: impl Into<String>, renderer: Arc<dyn AttributeRenderer>) -> Self {
        self.with(name, AttrOverride::Renderer(renderer))
    }

    pub fn get(&self, name: &str) -> Option<&AttrOverride> {
        self.entries.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// One renderable attribute of a node.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    element: ElementId,
    renderer: Arc<dyn AttributeRenderer>,
    nested: Option<AttrOverrides>,
}

impl Attribute {
    /// Pick the renderer for `field`: explicit override first, default otherwise.
    pub fn resolve(
        field: FieldSource<'_>,
        overrides: &AttrOverrides,
        default: &Arc<dyn AttributeRenderer>,
    ) -> Self {
        let name = field.name().to_string();
        let (renderer, nested) = match overrides.get(&name) {
            Some(AttrOverride::Renderer(r)) => (Arc::clone(r), None),
            Some(AttrOverride::Nested(table)) => (Arc::clone(default), Some(table.clone())),
            None => (Arc::clone(default), None),
        };
        Self {
            name,
            element: field.element(),
            renderer,
            nested,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self, doc: &dyn DocumentAdapter) -> Option<DisplayNode> {
        self.renderer
            .render(FieldSource::new(doc, self.element), self.nested.as_ref())
    }
}

/* ------------------------------------------------------------------------- */
/* Plain                                                                     */
/* ------------------------------------------------------------------------- */

/// Default rendering: composite values as an opened subtree, scalars as
/// `"name: value"` leaves.
#[derive(Debug, Clone, Copy)]
pub struct PlainRenderer {
    /// Add `bin/dec/hex` children under non-zero decimal integers.
    pub numeric_breakdown: bool,
}

impl Default for PlainRenderer {
    fn default() -> Self {
        Self {
            numeric_breakdown: true,
        }
    }
}

impl PlainRenderer {
    pub fn text_only() -> Self {
        Self {
            numeric_breakdown: false,
        }
    }

    pub fn leaf(&self, field: FieldSource<'_>) -> DisplayNode {
        let value = field.value();
        let mut node = DisplayNode::leaf(format!("{}: {}", field.name(), value));
        if self.numeric_breakdown {
            if let Some(n) = canonical_int(&value).filter(|n| *n != 0) {
                node.children = numeric_children(n, &value);
            }
        }
        node
    }

    pub fn tree(&self, field: FieldSource<'_>, nested: Option<&AttrOverrides>) -> DisplayNode {
        if !field.is_composite() {
            return self.leaf(field);
        }
        let children = field
            .children()
            .filter_map(|child| match nested.and_then(|n| n.get(child.name())) {
                Some(AttrOverride::Renderer(r)) => r.render(child, None),
                Some(AttrOverride::Nested(table)) => Some(self.tree(child, Some(table))),
                None => Some(self.tree(child, None)),
            })
            .collect();
        DisplayNode::branch(field.name(), children)
    }
}

impl AttributeRenderer for PlainRenderer {
    fn render(&self, field: FieldSource<'_>, nested: Option<&AttrOverrides>) -> Option<DisplayNode> {
        Some(self.tree(field, nested))
    }
}

/// Decimal integer written in canonical form (no sign noise, no leading zeros).
pub fn canonical_int(text: &str) -> Option<i64> {
    text.parse::<i64>().ok().filter(|n| n.to_string() == text)
}

fn numeric_children(n: i64, text: &str) -> Vec<DisplayNode> {
    let sign = if n < 0 { "-" } else { "" };
    let abs = n.unsigned_abs();
    vec![
        DisplayNode::leaf(format!("bin: {sign}0b{abs:b}")),
        DisplayNode::leaf(format!("dec: {text}")),
        DisplayNode::leaf(format!("hex: {sign}0x{abs:x}")),
    ]
}

/* ------------------------------------------------------------------------- */
/* Structured                                                                */
/* ------------------------------------------------------------------------- */

/// Plain rendering plus the ASCII reading of a hex string.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexStringRenderer {
    pub base: PlainRenderer,
}

impl AttributeRenderer for HexStringRenderer {
    fn render(&self, field: FieldSource<'_>, nested: Option<&AttrOverrides>) -> Option<DisplayNode> {
        let mut node = self.base.tree(field, nested);
        node.children = vec![DisplayNode::leaf(format!("\"{}\"", hex_to_ascii(&field.value())))];
        node.opened = Some(true);
        Some(node)
    }
}

/// Parser from a raw scalar to human-readable dump lines.
pub trait FieldDecoder: Send + Sync + fmt::Debug {
    /// `None` when `raw` does not decode.
    fn decode(&self, raw: &str) -> Option<Vec<String>>;
}

/// Plain rendering whose children are replaced by a decoder's dump.
///
/// Composite fields and undecodable values render exactly as plain.
#[derive(Debug, Clone)]
pub struct DecodedRenderer {
    decoder: Arc<dyn FieldDecoder>,
    base: PlainRenderer,
}

impl DecodedRenderer {
    pub fn new(decoder: Arc<dyn FieldDecoder>) -> Self {
        Self {
            decoder,
            base: PlainRenderer::default(),
        }
    }

    pub fn with_base(mut self, base: PlainRenderer) -> Self {
        self.base = base;
        self
    }
}

impl AttributeRenderer for DecodedRenderer {
    fn render(&self, field: FieldSource<'_>, nested: Option<&AttrOverrides>) -> Option<DisplayNode> {
        let mut node = self.base.tree(field, nested);
        if field.is_composite() {
            return Some(node);
        }
        if let Some(lines) = field.text().and_then(|raw| self.decoder.decode(&raw)) {
            node.children = dump_nodes(lines);
            node.opened = Some(true);
        }
        Some(node)
    }
}

/// Opened leaves for non-empty dump lines.
pub fn dump_nodes(lines: Vec<String>) -> Vec<DisplayNode> {
    lines
        .into_iter()
        .filter(|l| !l.is_empty())
        .map(|l| DisplayNode::leaf(l).opened(true))
        .collect()
}
