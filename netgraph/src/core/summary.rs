//! Build summary: counters and timings collected while a diagram is built.
//!
//! The structures here are:
//! - **Serializable** (written to `summary.json` by the exporters);
//! - **Stable** (snake_case field names, easy to grep and query);
//! - **Cheap** (counts come from the arenas, timings from one stopwatch).
//!
//! # Usage
//!
//! ```ignore
//! let mut sw = SummaryStopwatch::start();
//! // ... document parse ...
//! sw.stop_parse_document();
//! // ... phase 1 ...
//! sw.stop_build_nodes();
//! // ... phase 2 ...
//! sw.stop_resolve_links();
//! let timings = sw.into_timings();
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::document::DocumentFormat;
use crate::model::link::Link;
use crate::model::node::Node;
use crate::model::render::RenderGraph;

/// Counts and timings for one parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    /// RFC3339 UTC timestamp of the parse.
    pub generated_at: String,
    pub format: DocumentFormat,
    pub counts: Counts,
    pub timings_ms: TimingsMs,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counts {
    pub nodes: usize,
    pub links: usize,
    pub nodes_by_type: BTreeMap<String, usize>,
    /// Keyed by the snake_case link kind.
    pub links_by_kind: BTreeMap<String, usize>,
}

/// Millisecond timings for the build phases. Unmeasured phases stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingsMs {
    pub parse_document: u128,
    pub build_nodes: u128,
    pub resolve_links: u128,
    pub total: u128,
}

impl BuildSummary {
    /// Summary of the given arenas; timings default to zero.
    pub fn from_counts(
        format: DocumentFormat,
        generated_at: DateTime<Utc>,
        nodes: &[Node],
        links: &[Link],
    ) -> Self {
        let mut nodes_by_type: BTreeMap<String, usize> = BTreeMap::new();
        for n in nodes {
            *nodes_by_type.entry(n.type_name().to_string()).or_insert(0) += 1;
        }

        let mut links_by_kind: BTreeMap<String, usize> = BTreeMap::new();
        for l in links {
            *links_by_kind.entry(l.kind().to_string()).or_insert(0) += 1;
        }

        Self {
            generated_at: generated_at.to_rfc3339(),
            format,
            counts: Counts {
                nodes: nodes.len(),
                links: links.len(),
                nodes_by_type,
                links_by_kind,
            },
            timings_ms: TimingsMs::default(),
        }
    }

    pub fn with_timings(mut self, timings: TimingsMs) -> Self {
        self.timings_ms = timings;
        self
    }
}

/// Stopwatch over the build phases.
#[derive(Debug, Clone)]
pub struct SummaryStopwatch {
    started: Instant,
    last_mark: Instant,
    tm: TimingsMs,
}

impl SummaryStopwatch {
    #[inline]
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last_mark: now,
            tm: TimingsMs::default(),
        }
    }

    #[inline]
    pub fn stop_parse_document(&mut self) -> &mut Self {
        self.tm.parse_document = self.since_mark_ms();
        self
    }

    #[inline]
    pub fn stop_build_nodes(&mut self) -> &mut Self {
        self.tm.build_nodes = self.since_mark_ms();
        self
    }

    #[inline]
    pub fn stop_resolve_links(&mut self) -> &mut Self {
        self.tm.resolve_links = self.since_mark_ms();
        self
    }

    /// Timings so far, with `total` measured from the start.
    #[inline]
    pub fn timings(&self) -> TimingsMs {
        TimingsMs {
            total: as_millis(self.started.elapsed()),
            ..self.tm
        }
    }

    #[inline]
    pub fn into_timings(self) -> TimingsMs {
        self.timings()
    }

    /// Time since the last mark in milliseconds; moves the mark.
    #[inline]
    fn since_mark_ms(&mut self) -> u128 {
        let now = Instant::now();
        let d = now.duration_since(self.last_mark);
        self.last_mark = now;
        as_millis(d)
    }
}

/// Size and duration of one draw query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawSummary {
    pub nodes: usize,
    pub edges: usize,
    pub elapsed_ms: u128,
}

impl DrawSummary {
    /// Run a draw query and measure it.
    pub fn measure(draw: impl FnOnce() -> RenderGraph) -> (RenderGraph, Self) {
        let started = Instant::now();
        let graph = draw();
        let summary = Self {
            nodes: graph.nodes.len(),
            edges: graph.edges.len(),
            elapsed_ms: as_millis(started.elapsed()),
        };
        (graph, summary)
    }
}

#[inline]
fn as_millis(d: Duration) -> u128 {
    // Saturating, so absurd durations cannot panic.
    (d.as_secs() as u128)
        .saturating_mul(1_000)
        .saturating_add((d.subsec_nanos() as u128) / 1_000_000)
}
