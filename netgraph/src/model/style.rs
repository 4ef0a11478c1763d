//! Per-type presentation defaults.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::render::RenderNode;

/// Loosely typed scalar as it appears in YAML definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStyle {
    /// Replaces the type name in the default label.
    pub display_name: Option<String>,
    pub level: Option<i32>,
    pub color: Option<String>,
    pub margin: Option<u32>,
    pub shape: Option<String>,
    pub mass: Option<f32>,
    pub font_size: Option<u32>,
    /// Free-form metadata for node classes (e.g. reference chapter/page).
    pub details: IndexMap<String, Scalar>,
}

impl NodeStyle {
    /// Overwrite the presentational fields this style sets.
    pub fn apply(&self, out: &mut RenderNode) {
        if let Some(level) = self.level {
            out.level = Some(level);
        }
        if let Some(color) = &self.color {
            out.color = Some(color.clone());
        }
        if let Some(margin) = self.margin {
            out.margin = Some(margin);
        }
        if let Some(shape) = &self.shape {
            out.shape = Some(shape.clone());
        }
        if let Some(mass) = self.mass {
            out.mass = Some(mass);
        }
        if let Some(font_size) = self.font_size {
            out.font_size = Some(font_size);
        }
    }

    pub fn detail(&self, key: &str) -> Option<String> {
        self.details.get(key).map(ToString::to_string)
    }
}

/// Immutable type → style mapping shared by a builder and its diagrams.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleTable {
    styles: IndexMap<String, NodeStyle>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, type_name: impl Into<String>, style: NodeStyle) -> Self {
        self.styles.insert(type_name.into(), style);
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&NodeStyle> {
        self.styles.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }
}

impl FromIterator<(String, NodeStyle)> for StyleTable {
    fn from_iter<T: IntoIterator<Item = (String, NodeStyle)>>(iter: T) -> Self {
        Self {
            styles: iter.into_iter().collect(),
        }
    }
}
