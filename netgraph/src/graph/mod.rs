//! Two-phase diagram construction and the queries answered by a built diagram.
//!
//! ```text
//! GraphBuilder::parse ─▶ NodesBuilt (phase 1) ─▶ Diagram (phase 2)
//!                                                   │
//!                                                   ├─ draw / draw_with
//!                                                   ├─ draw_subtree / draw_view
//!                                                   └─ synthesize
//! ```
//!
//! Phase 1 creates every node before any pointer is looked at, because a
//! pointer target may appear anywhere in the document. Phase 2 turns the
//! resolved pointer descriptors into links.

pub mod builder;
pub mod diagram;
mod resolve;
pub mod subtree;
pub mod synthesis;
pub mod views;

pub use builder::{GraphBuilder, NodesBuilt};
pub use diagram::{Diagram, DrawOptions};
pub use subtree::{AvoidLinks, AvoidTarget, SubtreeFilter};
pub use synthesis::{LinkDraft, LinkSynthesizer, SynthesisReport};
pub use views::{DisplayProfile, ViewAnchor};
