//! Node, link and attribute models plus the render-side value types they produce.

pub mod attribute;
pub mod link;
pub mod node;
pub mod render;
pub mod style;

pub use attribute::{
    AttrOverride, AttrOverrides, Attribute, AttributeRenderer, DecodedRenderer, FieldDecoder,
    FieldSource, HexStringRenderer, PlainRenderer, canonical_int, dump_nodes,
};
pub use link::{Link, LinkId, LinkIdentity, LinkKind, LinkStyle, LinkView};
pub use node::{DefaultNodeClass, ElementView, Node, NodeClass, NodeId, NodeKey, NodeView};
pub use render::{
    CurveKind, DisplayNode, EdgeCurve, InspectorNode, RenderEdge, RenderGraph, RenderNode,
};
pub use style::{NodeStyle, Scalar, StyleTable};
