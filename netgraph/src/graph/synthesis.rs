//! Post-parse link synthesis.
//!
//! A [`LinkSynthesizer`] inspects a finished diagram and proposes links
//! ([`LinkDraft`]s), optionally retiring existing ones in exchange. All drafts
//! from one run go through a single normalize pass, so running the same hooks
//! again never adds edges.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::diagram::Diagram;
use super::resolve::attach;
use crate::model::link::{Link, LinkId, LinkIdentity, LinkKind};
use crate::model::node::NodeId;

/// Domain-specific link surgery, run after phase 2.
pub trait LinkSynthesizer: Send + Sync + fmt::Debug {
    /// Registry name.
    fn name(&self) -> &str;

    fn synthesize(&self, diagram: &Diagram) -> Vec<LinkDraft>;
}

/// A link to add, and the links it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDraft {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: LinkKind,
    pub from_label: String,
    pub to_label: String,
    pub note: Option<String>,
    pub replaces: Vec<LinkId>,
}

impl LinkDraft {
    pub fn new(from: NodeId, to: NodeId, kind: LinkKind) -> Self {
        Self {
            from,
            to,
            kind,
            from_label: String::new(),
            to_label: String::new(),
            note: None,
            replaces: Vec::new(),
        }
    }

    pub fn with_labels(mut self, from_label: impl Into<String>, to_label: impl Into<String>) -> Self {
        self.from_label = from_label.into();
        self.to_label = to_label.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Retire `link` when this draft is applied.
    pub fn replacing(mut self, link: LinkId) -> Self {
        self.replaces.push(link);
        self
    }

    pub fn identity(&self) -> LinkIdentity {
        LinkIdentity::of(self.kind, self.from, self.to)
    }
}

/// What one synthesis run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisReport {
    pub drafted: usize,
    pub added: usize,
    /// Drafts whose identity already existed.
    pub duplicates: usize,
    /// Drafts with an endpoint that is not a node.
    pub rejected: usize,
    pub retired: usize,
}

impl Diagram {
    /// Collect drafts from every hook, then normalize once.
    ///
    /// Normalization removes retired links, skips drafts whose identity is
    /// already present (including earlier drafts of the same run), then
    /// renumbers links and rebuilds every node's link list in order.
    #[instrument(level = "debug", skip_all, fields(hooks = hooks.len()))]
    pub fn synthesize(&mut self, hooks: &[Arc<dyn LinkSynthesizer>]) -> SynthesisReport {
        let mut drafts = Vec::new();
        for hook in hooks {
            let proposed = hook.synthesize(self);
            debug!(hook = hook.name(), drafts = proposed.len(), "synthesizer ran");
            drafts.extend(proposed);
        }

        let report = self.normalize(drafts);
        debug!(
            added = report.added,
            duplicates = report.duplicates,
            retired = report.retired,
            links = self.links.len(),
            "synthesis normalized"
        );
        report
    }

    fn normalize(&mut self, drafts: Vec<LinkDraft>) -> SynthesisReport {
        let mut report = SynthesisReport {
            drafted: drafts.len(),
            ..SynthesisReport::default()
        };
        let retired: HashSet<LinkId> = drafts
            .iter()
            .flat_map(|d| d.replaces.iter().copied())
            .collect();

        let previous = std::mem::take(&mut self.links);
        for node in &mut self.nodes {
            node.links.clear();
        }

        let mut seen: HashSet<LinkIdentity> = HashSet::with_capacity(previous.len() + drafts.len());
        for link in previous {
            if retired.contains(&link.id()) {
                report.retired += 1;
                continue;
            }
            seen.insert(link.identity());
            attach(&mut self.nodes, &mut self.links, link);
        }

        for draft in drafts {
            let (Some(from), Some(_)) = (self.node(draft.from), self.node(draft.to)) else {
                warn!(from = %draft.from, to = %draft.to, "draft endpoint is not a node");
                report.rejected += 1;
                continue;
            };
            if !seen.insert(draft.identity()) {
                report.duplicates += 1;
                continue;
            }

            let style = self.schema.link_style_for(from.rule());
            let link = Link::new(draft.from, draft.to, draft.kind)
                .with_labels(draft.from_label, draft.to_label)
                .with_note(draft.note)
                .with_style(style);
            attach(&mut self.nodes, &mut self.links, link);
            report.added += 1;
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentFormat;
    use crate::graph::builder::GraphBuilder;
    use crate::schema::{EntityRule, KeySource, PointerSpec, SchemaTable};

    /// Turns every `reference` link into a pair of traffic links.
    #[derive(Debug)]
    struct Split;

    impl LinkSynthesizer for Split {
        fn name(&self) -> &str {
            "split"
        }

        fn synthesize(&self, diagram: &Diagram) -> Vec<LinkDraft> {
            diagram
                .links()
                .iter()
                .filter(|l| l.kind() == LinkKind::Reference)
                .flat_map(|l| {
                    [
                        LinkDraft::new(l.from(), l.to(), LinkKind::Downstream).replacing(l.id()),
                        LinkDraft::new(l.to(), l.from(), LinkKind::Upstream).with_note("us"),
                    ]
                })
                .collect()
        }
    }

    fn diagram() -> Diagram {
        let schema = SchemaTable::new(DocumentFormat::Xml)
            .with_key(KeySource::Field("id".into()))
            .with_entity(
                "flow",
                EntityRule::new()
                    .with_child("rule", EntityRule::new())
                    .with_link(PointerSpec::field("port", "port").with_to("id")),
            )
            .with_entity("port", EntityRule::new());
        let raw = "<r><flow><id>1</id><port>2</port><rule><id>9</id></rule></flow><port><id>2</id></port></r>";
        GraphBuilder::new(schema).parse(raw).expect("parses")
    }

    #[test]
    fn drafts_replace_links_and_renumber() {
        let mut d = diagram();
        assert_eq!(d.link_count(), 2);

        let hooks: Vec<Arc<dyn LinkSynthesizer>> = vec![Arc::new(Split)];
        let report = d.synthesize(&hooks);
        assert_eq!(report.retired, 1);
        assert_eq!(report.added, 2);

        let kinds: Vec<_> = d.links().iter().map(|l| l.kind()).collect();
        assert_eq!(kinds, vec![LinkKind::Parent, LinkKind::Downstream, LinkKind::Upstream]);
        let ids: Vec<_> = d.links().iter().map(|l| l.id().get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        for node in d.nodes() {
            for &id in node.links() {
                assert!(d.link(id).and_then(|l| l.other_end(node.id())).is_some());
            }
        }
    }

    #[test]
    fn rerunning_never_adds_edges() {
        let mut d = diagram();
        let hooks: Vec<Arc<dyn LinkSynthesizer>> = vec![Arc::new(Split), Arc::new(Split)];
        let first = d.synthesize(&hooks);
        assert_eq!(first.duplicates, 2);
        let count = d.link_count();

        let second = d.synthesize(&hooks);
        assert_eq!(second.added, 0);
        assert_eq!(d.link_count(), count);
    }

    #[test]
    fn drafts_with_unknown_endpoints_are_rejected() {
        #[derive(Debug)]
        struct Dangling;
        impl LinkSynthesizer for Dangling {
            fn name(&self) -> &str {
                "dangling"
            }
            fn synthesize(&self, _: &Diagram) -> Vec<LinkDraft> {
                let known = NodeId::new(1).expect("non-zero");
                let unknown = NodeId::new(99).expect("non-zero");
                vec![LinkDraft::new(known, unknown, LinkKind::Bidirectional)]
            }
        }

        let mut d = diagram();
        let report = d.synthesize(&[Arc::new(Dangling) as Arc<dyn LinkSynthesizer>]);
        assert_eq!(report.rejected, 1);
        assert_eq!(d.link_count(), 2);
    }
}
