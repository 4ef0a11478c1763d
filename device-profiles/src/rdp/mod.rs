//! RDP network-processor dumps as JSON.
//!
//! Top-level members are keyed collections (`"port": {"port/index=0": {…}}`),
//! so nodes are keyed by member name. Flows reference ports and GEMs by
//! bare index; the transforms below restore the collection key.

pub mod traffic;

use std::sync::Arc;

use netgraph::Registry;
use netgraph::model::{
    AttrOverrides, AttributeRenderer, DisplayNode, FieldSource, NodeClass, NodeView, PlainRenderer, RenderNode,
};
use netgraph::schema::TransformHook;

pub use traffic::TrafficLinks;

/// Register every RDP strategy and hook.
pub fn register(registry: &mut Registry) {
    registry
        .register_node_class("rdp", Arc::new(RdpNodeClass::Plain))
        .register_node_class("rdp_gem", Arc::new(RdpNodeClass::Gem))
        .register_node_class("rdp_egress_tm", Arc::new(RdpNodeClass::EgressTm))
        .register_node_class("rdp_ingress_class", Arc::new(RdpNodeClass::IngressClass))
        .register_node_class("rdp_queue_cfg", Arc::new(RdpNodeClass::QueueCfg))
        .register_renderer("rdp_collapsed", Arc::new(CollapsedRenderer::new(Suffix::None)))
        .register_renderer("rdp_queue_cfg", Arc::new(CollapsedRenderer::new(Suffix::QueueId)))
        .register_renderer("rdp_packets", Arc::new(CollapsedRenderer::new(Suffix::Counters)))
        .register_transform(TransformHook::new("rdp_port_ref", |raw| Some(format!("port/index={raw}"))))
        .register_transform(TransformHook::new("rdp_gem_ref", |raw| Some(format!("gem/index={raw}"))))
        .register_synthesizer(Arc::new(TrafficLinks));
}

/* ------------------------------------------------------------------------- */
/* Nodes                                                                     */
/* ------------------------------------------------------------------------- */

/// Boxes labelled with their collection key plus a per-type detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdpNodeClass {
    Plain,
    /// `key\n(port <gem_port>)`
    Gem,
    /// `key\n(<mode>)`
    EgressTm,
    /// `key\n(prty <cfg/prty>)`
    IngressClass,
    /// `key - qid <queue_id>`
    QueueCfg,
}

impl NodeClass for RdpNodeClass {
    fn display_name(&self, node: NodeView<'_>) -> String {
        let key = node.key();
        let detail = match self {
            Self::Plain => None,
            Self::Gem => node.field("gem_port").map(|port| format!("{key}\n(port {port})")),
            Self::EgressTm => node.field("mode").map(|mode| format!("{key}\n({mode})")),
            Self::IngressClass => node.field("cfg/prty").map(|prty| format!("{key}\n(prty {prty})")),
            Self::QueueCfg => node.field("queue_id").map(|qid| format!("{key} - qid {qid}")),
        };
        detail.unwrap_or_else(|| node.default_display_name())
    }

    fn defaults(&self, out: &mut RenderNode) {
        out.shape = Some("box".into());
        out.margin = Some(20);
        out.font_size = Some(26);
    }
}

/* ------------------------------------------------------------------------- */
/* Attributes                                                                */
/* ------------------------------------------------------------------------- */

/// What a collapsed attribute appends to its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix {
    None,
    /// ` - qid N` from a `queue_id` member, on the value or on each row.
    QueueId,
    /// ` - pN, bM` from `packets`/`bytes` counters.
    Counters,
}

/// Plain rendering, collapsed in the inspector.
#[derive(Debug, Clone, Copy)]
pub struct CollapsedRenderer {
    suffix: Suffix,
    base: PlainRenderer,
}

impl CollapsedRenderer {
    pub fn new(suffix: Suffix) -> Self {
        Self {
            suffix,
            base: PlainRenderer::default(),
        }
    }
}

fn member(field: &FieldSource<'_>, name: &str) -> Option<String> {
    field.child(name).and_then(|c| c.text())
}

fn counters(field: &FieldSource<'_>) -> Option<String> {
    let parts: Vec<String> = [("p", "packets"), ("b", "bytes")]
        .into_iter()
        .filter_map(|(tag, name)| member(field, name).map(|v| format!("{tag}{v}")))
        .collect();
    (!parts.is_empty()).then(|| format!(" - {}", parts.join(", ")))
}

impl AttributeRenderer for CollapsedRenderer {
    fn render(&self, field: FieldSource<'_>, nested: Option<&AttrOverrides>) -> Option<DisplayNode> {
        let mut node = self.base.tree(field, nested);
        node.opened = Some(false);

        match self.suffix {
            Suffix::None => {}
            Suffix::Counters => {
                if let Some(suffix) = counters(&field) {
                    node.label.push_str(&suffix);
                }
            }
            Suffix::QueueId => match member(&field, "queue_id") {
                Some(qid) => node.label.push_str(&format!(" - qid {qid}")),
                None => {
                    for (row, source) in node.children.iter_mut().zip(field.children()) {
                        if let Some(qid) = member(&source, "queue_id") {
                            row.label.push_str(&format!(" - qid {qid}"));
                        }
                    }
                }
            },
        }
        Some(node)
    }
}
