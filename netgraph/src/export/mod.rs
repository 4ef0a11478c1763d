//! Render output persisted to disk.
//!
//! Layout of one export directory:
//!
//! ```text
//! out_dir/
//!   render_nodes.jsonl
//!   render_edges.jsonl
//!   graph.graphml
//!   summary.json
//! ```

pub mod graphml;
pub mod jsonl;
pub mod save_all;
