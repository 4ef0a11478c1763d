//! Persist one render result and its build summary into a directory.
//!
//! `out_dir` is normally a timestamped folder chosen by the caller; it is
//! created when missing. Existing files with the same names are overwritten.

use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs,
    path::Path,
};
use tracing::info;

use crate::core::summary::BuildSummary;
use crate::export::{graphml::write_graphml, jsonl};
use crate::model::render::RenderGraph;

/// Paths of the written artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct PersistFiles {
    pub render_nodes_jsonl: String,
    pub render_edges_jsonl: String,
    pub graph_graphml: String,
    pub summary_json: String,
}

/// Returned to the caller and written to `summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct PersistSummary {
    pub out_dir: String,
    pub files: PersistFiles,
    /// Counts of the rendered subset, which may differ from the build counts.
    pub rendered_nodes_by_type: BTreeMap<String, usize>,
    pub rendered_edges_by_kind: BTreeMap<String, usize>,
    pub summary: BuildSummary,
}

/// Write every artifact for `render` into `out_dir`.
pub fn persist_all(out_dir: &Path, render: &RenderGraph, summary: &BuildSummary) -> Result<PersistSummary> {
    fs::create_dir_all(out_dir).with_context(|| format!("create_dir_all {}", out_dir.display()))?;
    info!("persist: dir prepared -> {}", out_dir.display());

    let p_nodes = out_dir.join("render_nodes.jsonl");
    let p_edges = out_dir.join("render_edges.jsonl");
    let p_graphml = out_dir.join("graph.graphml");
    let p_summary = out_dir.join("summary.json");

    jsonl::write_render_jsonl(&p_nodes, &p_edges, render)?;
    write_graphml(&p_graphml, &render.to_petgraph())?;

    let mut rendered_nodes_by_type: BTreeMap<String, usize> = BTreeMap::new();
    for n in &render.nodes {
        *rendered_nodes_by_type.entry(n.type_name.clone()).or_insert(0) += 1;
    }
    let mut rendered_edges_by_kind: BTreeMap<String, usize> = BTreeMap::new();
    for e in &render.edges {
        *rendered_edges_by_kind.entry(e.kind.to_string()).or_insert(0) += 1;
    }

    let persist = PersistSummary {
        out_dir: out_dir.to_string_lossy().into_owned(),
        files: PersistFiles {
            render_nodes_jsonl: p_nodes.to_string_lossy().into_owned(),
            render_edges_jsonl: p_edges.to_string_lossy().into_owned(),
            graph_graphml: p_graphml.to_string_lossy().into_owned(),
            summary_json: p_summary.to_string_lossy().into_owned(),
        },
        rendered_nodes_by_type,
        rendered_edges_by_kind,
        summary: summary.clone(),
    };

    {
        let f = fs::File::create(&p_summary)
            .with_context(|| format!("create {}", p_summary.display()))?;
        let w = std::io::BufWriter::new(f);
        serde_json::to_writer_pretty(w, &persist)
            .with_context(|| format!("write {}", p_summary.display()))?;
    }

    info!("persist: all artifacts written");
    Ok(persist)
}
