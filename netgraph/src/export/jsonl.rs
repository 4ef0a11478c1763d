//! JSONL writers for render output.
//!
//! One compact JSON object per line: easy to grep and to stream. Nodes and
//! edges are written exactly as they serialize, so the line format follows
//! [`RenderNode`](crate::model::render::RenderNode) and
//! [`RenderEdge`](crate::model::render::RenderEdge).

use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use tracing::info;

use crate::model::render::RenderGraph;

/// Write `graph` as `nodes_path` + `edges_path`.
pub fn write_render_jsonl(nodes_path: &Path, edges_path: &Path, graph: &RenderGraph) -> Result<()> {
    write_lines(nodes_path, &graph.nodes)?;
    write_lines(edges_path, &graph.edges)?;
    info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "jsonl: wrote render graph -> {}",
        nodes_path.display()
    );
    Ok(())
}

fn write_lines<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);

    for item in items {
        serde_json::to_writer(&mut w, item)
            .with_context(|| format!("serialize line for {}", path.display()))?;
        w.write_all(b"\n")?;
    }

    w.flush()?;
    Ok(())
}
