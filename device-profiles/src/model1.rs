//! BBF-style forwarder/interface configuration as XML.
//!
//! Interfaces are laid out by their IANA/BBF interface type: physical and
//! line types sit further right and are drawn red.

use std::sync::Arc;

use netgraph::Registry;
use netgraph::model::{ElementView, NodeClass, NodeKey, NodeView, RenderNode};

pub const KEY_FIELD: &str = "name";
const EGRESS_REWRITE_KEY: &str = "egress-rewrite";

/// Register every Model1 strategy.
pub fn register(registry: &mut Registry) {
    registry
        .register_node_class("model1", Arc::new(Model1NodeClass))
        .register_node_class("model1_interface", Arc::new(InterfaceNodeClass))
        .register_node_class("model1_egress_rewrite", Arc::new(EgressRewriteNodeClass));
}

fn tagged_label(type_name: &str, key: impl std::fmt::Display) -> String {
    format!("<{type_name}>\n{key}")
}

/// `<type>` over the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Model1NodeClass;

impl NodeClass for Model1NodeClass {
    fn display_name(&self, node: NodeView<'_>) -> String {
        tagged_label(node.type_name(), node.key())
    }
}

/// Level offset and highlight color per interface type.
fn interface_layout(if_type: &str) -> Option<(i32, &'static str)> {
    match if_type {
        "ianaift:ethernetCsmacd" | "ianaift:ptm" => Some((1, "red")),
        "ianaift:fastdsl" => Some((2, "red")),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InterfaceNodeClass;

impl NodeClass for InterfaceNodeClass {
    fn display_name(&self, node: NodeView<'_>) -> String {
        let label = tagged_label(node.type_name(), node.key());
        match node.field("type").as_deref().and_then(|t| t.split(':').nth(1)) {
            Some(short) => format!("{label}\n{short}"),
            None => label,
        }
    }

    fn decorate(&self, node: NodeView<'_>, out: &mut RenderNode) {
        let Some((offset, color)) = node.field("type").as_deref().and_then(interface_layout) else {
            return;
        };
        let base = node.style().and_then(|s| s.level).unwrap_or(0);
        out.level = Some(base + offset);
        out.color = Some(color.to_string());
    }
}

/// Materialised only when it has content; always keyed `egress-rewrite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EgressRewriteNodeClass;

impl NodeClass for EgressRewriteNodeClass {
    fn admit(&self, element: ElementView<'_>, _key: Option<NodeKey>) -> Option<NodeKey> {
        (element.child_count() > 0).then(|| NodeKey::from(EGRESS_REWRITE_KEY))
    }

    fn display_name(&self, node: NodeView<'_>) -> String {
        tagged_label(node.type_name(), "EGRESS_REWRITE")
    }
}
