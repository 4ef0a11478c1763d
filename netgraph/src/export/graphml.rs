//! GraphML exporter for Gephi, yEd and similar tools.
//!
//! Nodes carry label, type, level and color; edges carry label and kind.
//! Node ids are the diagram ids (`n<id>`), so the file lines up with the
//! JSONL export.

use anyhow::{Context, Result};
use petgraph::graph::Graph;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use tracing::info;

use crate::model::render::{RenderEdge, RenderNode};

const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xsi:schemaLocation="http://graphml.graphdrawing.org/xmlns
     http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd">
<key id="d0" for="node" attr.name="label" attr.type="string"/>
<key id="d1" for="node" attr.name="type" attr.type="string"/>
<key id="d2" for="node" attr.name="level" attr.type="int"/>
<key id="d3" for="node" attr.name="color" attr.type="string"/>
<key id="e0" for="edge" attr.name="label" attr.type="string"/>
<key id="e1" for="edge" attr.name="kind" attr.type="string"/>"#;

/// Write GraphML to `path`.
pub fn write_graphml(path: &Path, graph: &Graph<RenderNode, RenderEdge>) -> Result<()> {
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);

    writeln!(w, "{HEADER}")?;
    writeln!(w, r#"<graph edgedefault="directed">"#)?;

    for nidx in graph.node_indices() {
        let n = &graph[nidx];
        writeln!(w, r#"<node id="n{}">"#, n.id)?;
        writeln!(w, r#"  <data key="d0">{}</data>"#, xml_escape(&n.label))?;
        writeln!(w, r#"  <data key="d1">{}</data>"#, xml_escape(&n.type_name))?;
        if let Some(level) = n.level {
            writeln!(w, r#"  <data key="d2">{level}</data>"#)?;
        }
        if let Some(color) = &n.color {
            writeln!(w, r#"  <data key="d3">{}</data>"#, xml_escape(color))?;
        }
        writeln!(w, r#"</node>"#)?;
    }

    for eidx in graph.edge_indices() {
        let e = &graph[eidx];
        writeln!(
            w,
            r#"<edge id="e{}" source="n{}" target="n{}">"#,
            e.id, e.from, e.to
        )?;
        writeln!(w, r#"  <data key="e0">{}</data>"#, xml_escape(&e.label))?;
        writeln!(w, r#"  <data key="e1">{}</data>"#, e.kind)?;
        writeln!(w, r#"</edge>"#)?;
    }

    writeln!(w, r#"</graph>"#)?;
    writeln!(w, r#"</graphml>"#)?;
    w.flush()?;
    info!("graphml: wrote -> {}", path.display());
    Ok(())
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
