//! Traffic links: flows squeezed between their ingress and egress endpoints.
//!
//! A classified flow references the port or GEM it matches on (`key/…`) and
//! the port or GEM it forwards to (`result/…`). Both references are replaced
//! with directed links `ingress → flow → egress`, tagged with the traffic
//! direction of the owning ingress class (`dir=us`, `dir=ds`).

use netgraph::Diagram;
use netgraph::graph::{LinkDraft, LinkSynthesizer};
use netgraph::model::{Link, LinkKind, Node, NodeId};
use tracing::debug;

const FLOW_TYPE: &str = "flow";
const INGRESS_POINTERS: [&str; 2] = ["key/ingress_port", "key/gem_flow"];
const EGRESS_POINTERS: [&str; 2] = ["result/egress_port", "result/wan_flow"];

#[derive(Debug, Clone, Copy, Default)]
pub struct TrafficLinks;

/// Direction of the ingress class owning `flow`.
fn direction(diagram: &Diagram, flow: &Node) -> LinkKind {
    let class_key = flow
        .parent()
        .and_then(|id| diagram.node(id))
        .map(|class| class.key().to_string())
        .unwrap_or_default();

    let dir = class_key
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .split(',')
        .find_map(|part| part.trim().strip_prefix("dir="));
    match dir {
        Some("us") => LinkKind::Upstream,
        Some("ds") => LinkKind::Downstream,
        _ => LinkKind::Bidirectional,
    }
}

fn redraw(link: &Link, from: NodeId, to: NodeId, kind: LinkKind) -> LinkDraft {
    let mut draft = LinkDraft::new(from, to, kind)
        .with_labels(link.from_label(), link.to_label())
        .replacing(link.id());
    if let Some(note) = link.note() {
        draft = draft.with_note(note);
    }
    draft
}

impl LinkSynthesizer for TrafficLinks {
    fn name(&self) -> &str {
        "rdp_traffic"
    }

    fn synthesize(&self, diagram: &Diagram) -> Vec<LinkDraft> {
        let mut drafts = Vec::new();
        for flow in diagram.nodes_of_type(FLOW_TYPE) {
            let kind = direction(diagram, flow);
            for link in diagram.links_of(flow.id()) {
                if link.kind() != LinkKind::Reference || link.from() != flow.id() {
                    continue;
                }
                let label = link.from_label();
                if INGRESS_POINTERS.contains(&label) {
                    drafts.push(redraw(link, link.to(), flow.id(), kind));
                } else if EGRESS_POINTERS.contains(&label) {
                    drafts.push(redraw(link, flow.id(), link.to(), kind));
                }
            }
        }
        debug!(drafts = drafts.len(), "traffic links drafted");
        drafts
    }
}
