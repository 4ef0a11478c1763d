//! Phase 2: pointer descriptors → links.

use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, trace};

use super::builder::NodesBuilt;
use super::diagram::Diagram;
use crate::core::summary::TimingsMs;
use crate::document::DocumentAdapter;
use crate::model::link::{Link, LinkId};
use crate::model::node::{Node, NodeId};

/// Target-side label of a link matched on the natural key.
pub(crate) const KEY_LABEL: &str = "key";

impl NodesBuilt {
    /// Resolve every pointer into links.
    ///
    /// Nodes are visited per type in index order, then in list order. Each
    /// node contributes its parent link first, then one link per resolved
    /// value, in declaration and document order. A value resolves to the
    /// first candidate type holding a match; misses are dropped.
    pub fn resolve_links(self) -> Diagram {
        let NodesBuilt {
            schema,
            styles,
            doc,
            mut nodes,
            by_type,
            generated_at,
        } = self;

        let mut links = Vec::new();
        let mut lookup = KeyLookup::default();
        let mut unresolved = 0usize;

        for ids in by_type.values() {
            for &id in ids {
                let Some(node) = node_at(&nodes, id) else {
                    continue;
                };

                let mut created = Vec::new();
                if let Some(parent) = node.parent() {
                    created.push(Link::parent(id, parent));
                }

                let style = schema.link_style_for(node.rule());
                for pointer in node.collect_link_specs(doc.as_ref()) {
                    let to_label = pointer.to_field.as_deref().unwrap_or(KEY_LABEL);
                    for value in &pointer.values {
                        let target = pointer.candidates.iter().find_map(|type_name| {
                            lookup.find(&nodes, doc.as_ref(), &by_type, type_name, pointer.to_field.as_deref(), value)
                        });
                        let Some(to) = target else {
                            unresolved += 1;
                            trace!(
                                from = %id,
                                field = %pointer.from_label,
                                value = %value,
                                "pointer unresolved"
                            );
                            continue;
                        };
                        created.push(
                            Link::new(id, to, pointer.kind)
                                .with_labels(pointer.from_label.clone(), to_label)
                                .with_note(pointer.note.clone())
                                .with_style(style.clone()),
                        );
                    }
                }

                for link in created {
                    attach(&mut nodes, &mut links, link);
                }
            }
        }

        debug!(links = links.len(), unresolved, "links resolved");

        Diagram {
            schema,
            styles,
            doc,
            nodes,
            by_type,
            links,
            timings: TimingsMs::default(),
            generated_at,
        }
    }
}

pub(crate) fn node_at(nodes: &[Node], id: NodeId) -> Option<&Node> {
    id.index().and_then(|i| nodes.get(i))
}

/// Append `link` to the global list and to both endpoints (once for a self-loop).
pub(crate) fn attach(nodes: &mut [Node], links: &mut Vec<Link>, mut link: Link) -> LinkId {
    let id = LinkId::from_index(links.len());
    link.id = id;

    let (from, to) = (link.from(), link.to());
    if let Some(node) = from.index().and_then(|i| nodes.get_mut(i)) {
        node.links.push(id);
    }
    if to != from {
        if let Some(node) = to.index().and_then(|i| nodes.get_mut(i)) {
            node.links.push(id);
        }
    }
    links.push(link);
    id
}

/// Value a node is matched on: the first value of `field`, or its natural key
/// as written (an integer key `007` matches `007`, not `7`).
pub(crate) fn match_value(node: &Node, doc: &dyn DocumentAdapter, field: Option<&str>) -> Option<String> {
    match field {
        Some(field) => doc.first_value(node.element(), field),
        None => Some(node.key_text().to_string()),
    }
}

/// Lazily built `(type, field) → value → first node` index.
///
/// Only the first node per value is kept, which gives the same answer as a
/// linear scan in list order.
#[derive(Default)]
struct KeyLookup {
    index: HashMap<(String, Option<String>), HashMap<String, NodeId>>,
}

impl KeyLookup {
    fn find(
        &mut self,
        nodes: &[Node],
        doc: &dyn DocumentAdapter,
        by_type: &IndexMap<String, Vec<NodeId>>,
        type_name: &str,
        field: Option<&str>,
        value: &str,
    ) -> Option<NodeId> {
        let ids = by_type.get(type_name)?;
        let values = self
            .index
            .entry((type_name.to_string(), field.map(str::to_string)))
            .or_insert_with(|| {
                let mut map = HashMap::with_capacity(ids.len());
                for &id in ids {
                    let Some(node) = node_at(nodes, id) else {
                        continue;
                    };
                    if let Some(v) = match_value(node, doc, field) {
                        map.entry(v).or_insert(id);
                    }
                }
                map
            });
        values.get(value).copied()
    }
}
