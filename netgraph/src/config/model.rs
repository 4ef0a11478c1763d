//! Profile definition structures, as written in YAML.
//!
//! Groups:
//! - [`ProfileDef`]: top-level container with schema, styles, display profile, hooks, limits
//! - [`SchemaDef`]: table-wide defaults plus ordered [`EntityDef`]s
//! - [`EntityDef`]: one entity type (key, node class, attributes, pointers, children)
//! - [`PointerDef`]: one cross-reference rule
//! - [`Limits`]: parse limits
//!
//! Strategy names (node classes, renderers, link styles, hooks) stay strings
//! here; they are resolved when the schema is compiled.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::DocumentFormat;
use crate::graph::views::DisplayProfile;
use crate::model::link::LinkKind;
use crate::model::style::{Scalar, StyleTable};
use crate::schema::{KeyParse, KeySource, TargetTypes};

/// Top-level profile definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDef {
    pub name: String,
    pub schema: SchemaDef,
    #[serde(default)]
    pub styles: StyleTable,
    #[serde(default)]
    pub display: DisplayProfile,
    /// Link synthesizers run after every parse, in order.
    #[serde(default)]
    pub synthesizers: Vec<String>,
    #[serde(default)]
    pub limits: Limits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDef {
    pub format: DocumentFormat,
    #[serde(default)]
    pub key: KeySource,
    #[serde(default)]
    pub key_parse: KeyParse,
    #[serde(default)]
    pub node_class: Option<String>,
    #[serde(default)]
    pub link_style: Option<String>,
    #[serde(default)]
    pub attribute_renderer: Option<String>,
    pub types: IndexMap<String, EntityDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityDef {
    pub node_class: Option<String>,
    pub key: Option<KeySource>,
    pub link_style: Option<String>,
    pub attributes: IndexMap<String, AttrOverrideDef>,
    pub links: Vec<PointerDef>,
    pub children: IndexMap<String, EntityDef>,
}

/// Renderer name, or a nested table for composite attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrOverrideDef {
    Renderer(String),
    Nested(IndexMap<String, AttrOverrideDef>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerDef {
    pub from: Option<String>,
    pub to: Option<String>,
    pub note: Option<String>,
    pub kind: Option<LinkKind>,
    pub target: Option<TargetDef>,
    pub target_fn: Option<String>,
    pub target_map: Option<TargetMapDef>,
    pub value: Option<Scalar>,
    pub value_fn: Option<String>,
    pub transform: Option<String>,
}

/// `"A"`, `"A|B"` or `[A, B]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetDef {
    One(String),
    Many(Vec<String>),
}

impl TargetDef {
    pub fn to_types(&self) -> TargetTypes {
        match self {
            Self::One(spec) => TargetTypes::parse(spec),
            Self::Many(specs) => specs.iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetMapDef {
    pub field: String,
    pub map: IndexMap<String, MapEntryDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MapEntryDef {
    Types(TargetDef),
    Specs(Vec<PointerDef>),
}

/// Parse limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Reject documents above this size. Must be > 0.
    pub max_document_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_document_bytes: 64 * 1024 * 1024,
        }
    }
}
