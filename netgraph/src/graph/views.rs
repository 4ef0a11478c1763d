//! Named views over a diagram: anchored subtrees and link-kind filters.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use super::diagram::{Diagram, DrawOptions};
use super::subtree::SubtreeFilter;
use crate::model::link::LinkKind;
use crate::model::render::RenderGraph;

/// What a device family offers to look at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayProfile {
    /// Anchor type → filter applied when drawing from a node of that type.
    pub anchors: IndexMap<String, SubtreeFilter>,
    /// View name → link kinds shown. The first view is the default.
    pub link_views: IndexMap<String, Vec<LinkKind>>,
}

impl DisplayProfile {
    pub fn default_link_view(&self) -> Option<&str> {
        self.link_views.keys().next().map(String::as_str)
    }

    /// Kinds of `view`, or of the default view when `view` is `None`.
    /// An unknown view name falls back to the default with a warning.
    pub fn link_kinds(&self, view: Option<&str>) -> Option<&[LinkKind]> {
        if let Some(name) = view {
            if let Some(kinds) = self.link_views.get(name) {
                return Some(kinds);
            }
            warn!(view = name, "unknown link view, using the default");
        }
        self.link_views.values().next().map(Vec::as_slice)
    }
}

/// `"Type key"`, as listed in a view menu.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewAnchor {
    pub type_name: String,
    pub key: String,
}

impl ViewAnchor {
    pub fn new(type_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ViewAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.type_name, self.key)
    }
}

impl FromStr for ViewAnchor {
    type Err = String;

    /// Splits on the first space; the key may itself contain spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (type_name, key) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| format!("view anchor `{s}` is not `Type key`"))?;
        let (type_name, key) = (type_name.trim(), key.trim());
        if type_name.is_empty() || key.is_empty() {
            return Err(format!("view anchor `{s}` is not `Type key`"));
        }
        Ok(Self::new(type_name, key))
    }
}

impl Diagram {
    /// One anchor per node of every anchor type, in profile then list order.
    pub fn views(&self, profile: &DisplayProfile) -> Vec<ViewAnchor> {
        profile
            .anchors
            .keys()
            .flat_map(|type_name| {
                self.nodes_of_type(type_name)
                    .filter_map(|n| self.anchor_key(n))
                    .map(move |key| ViewAnchor::new(type_name.as_str(), key))
            })
            .collect()
    }

    /// Subtree from `anchor` with the anchor type's filter. A link view, when
    /// the profile has any, further restricts the kinds followed.
    pub fn draw_view(&self, profile: &DisplayProfile, anchor: &ViewAnchor, link_view: Option<&str>) -> RenderGraph {
        let mut filter = profile
            .anchors
            .get(&anchor.type_name)
            .cloned()
            .unwrap_or_default();
        if let Some(kinds) = profile.link_kinds(link_view) {
            filter.link_kinds = Some(kinds.to_vec());
        }
        self.draw_subtree_with(&anchor.type_name, &anchor.key, &filter)
    }

    /// Whole diagram restricted to the kinds of one link view.
    pub fn draw_link_view(&self, profile: &DisplayProfile, link_view: Option<&str>) -> RenderGraph {
        self.draw_with(&DrawOptions {
            excluded_types: Vec::new(),
            link_kinds: profile.link_kinds(link_view).map(<[LinkKind]>::to_vec),
        })
    }
}
