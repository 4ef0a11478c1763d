//! Schema-driven graph builder for hierarchical device telemetry.
//!
//! A raw XML or JSON dump of a device's object model goes in; a [`Diagram`]
//! of typed nodes and kind-tagged links comes out. What counts as a node,
//! how it is keyed and which fields point where is declared in a
//! [`SchemaTable`], usually compiled from a YAML [`config::model::ProfileDef`]
//! against a [`Registry`] of named strategies.
//!
//! ```ignore
//! let def = netgraph::config::load_profile_from_str(yaml)?;
//! let profile = netgraph::Profile::compile(&def, &registry)?;
//! let diagram = profile.parse(&raw)?;
//! let graph = diagram.draw_subtree("OntG", "0", &[], &Default::default());
//! ```

pub mod config;
pub mod core;
pub mod decode;
pub mod document;
pub mod error_handler;
pub mod export;
pub mod graph;
pub mod model;
pub mod schema;
pub mod telemetry;

pub use config::Profile;
pub use error_handler::{NetGraphError, Result};
pub use graph::{Diagram, DrawOptions, GraphBuilder, SubtreeFilter};
pub use model::{RenderGraph, RenderNode, RenderEdge};
pub use schema::{Registry, SchemaTable};
