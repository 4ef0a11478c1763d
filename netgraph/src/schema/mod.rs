//! Compiled schema tables.
//!
//! A [`SchemaTable`] is the runtime form of a schema definition: every name
//! has been resolved against a [`Registry`] exactly once, so a parse never
//! looks anything up by string. Tables can also be assembled directly with
//! the builder methods, which is what the tests do.

mod compile;
pub mod pointer;
pub mod registry;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::sync::Arc;

use crate::document::DocumentFormat;
use crate::model::attribute::{AttrOverride, AttrOverrides, AttributeRenderer, PlainRenderer};
use crate::model::link::LinkStyle;
use crate::model::node::{DefaultNodeClass, NodeClass};

pub use pointer::{
    MapTarget, PointerSpec, ResolvedPointer, TargetHook, TargetRule, TargetTypes, TransformHook,
    ValueHook, ValueRule,
};
pub use registry::Registry;

/// Where a node's natural key comes from.
///
/// Written `element_name`, `{ field: <path> }` or `{ fixed: <key> }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeySource {
    /// First value of a field path.
    Field(String),
    /// JSON member name / array index, or XML tag.
    #[default]
    ElementName,
    /// Constant key, for singleton entities.
    Fixed(String),
}

const ELEMENT_NAME_KEY: &str = "element_name";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum KeySourceDef {
    Named(String),
    Field { field: String },
    Fixed { fixed: String },
}

impl Serialize for KeySource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let def = match self {
            Self::Field(field) => KeySourceDef::Field { field: field.clone() },
            Self::ElementName => KeySourceDef::Named(ELEMENT_NAME_KEY.to_string()),
            Self::Fixed(fixed) => KeySourceDef::Fixed { fixed: fixed.clone() },
        };
        def.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for KeySource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match KeySourceDef::deserialize(deserializer)? {
            KeySourceDef::Named(name) if name.trim() == ELEMENT_NAME_KEY => Ok(Self::ElementName),
            KeySourceDef::Named(name) => Err(de::Error::custom(format!(
                "unknown key source `{name}`, expected `{ELEMENT_NAME_KEY}`, `{{ field: .. }}` or `{{ fixed: .. }}`"
            ))),
            KeySourceDef::Field { field } => Ok(Self::Field(field)),
            KeySourceDef::Fixed { fixed } => Ok(Self::Fixed(fixed)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyParse {
    #[default]
    Text,
    /// Decimal `i64` when the text parses, text otherwise.
    Integer,
}

/// Parsing and linking rules for one entity type.
#[derive(Debug, Clone, Default)]
pub struct EntityRule {
    node_class: Option<Arc<dyn NodeClass>>,
    key: Option<KeySource>,
    attributes: AttrOverrides,
    links: Vec<PointerSpec>,
    children: IndexMap<String, Arc<EntityRule>>,
    link_style: Option<Arc<dyn LinkStyle>>,
}

impl EntityRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node_class(mut self, class: Arc<dyn NodeClass>) -> Self {
        self.node_class = Some(class);
        self
    }

    pub fn with_key(mut self, key: KeySource) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttrOverride) -> Self {
        self.attributes = self.attributes.with(name, value);
        self
    }

    pub fn with_attributes(mut self, attributes: AttrOverrides) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_link(mut self, pointer: PointerSpec) -> Self {
        self.links.push(pointer);
        self
    }

    pub fn with_child(mut self, type_name: impl Into<String>, rule: EntityRule) -> Self {
        self.children.insert(type_name.into(), Arc::new(rule));
        self
    }

    pub fn with_link_style(mut self, style: Arc<dyn LinkStyle>) -> Self {
        self.link_style = Some(style);
        self
    }

    pub fn node_class(&self) -> Option<&Arc<dyn NodeClass>> {
        self.node_class.as_ref()
    }

    pub fn key(&self) -> Option<&KeySource> {
        self.key.as_ref()
    }

    pub fn attributes(&self) -> &AttrOverrides {
        &self.attributes
    }

    pub fn links(&self) -> &[PointerSpec] {
        &self.links
    }

    pub fn children(&self) -> &IndexMap<String, Arc<EntityRule>> {
        &self.children
    }

    pub fn link_style(&self) -> Option<&Arc<dyn LinkStyle>> {
        self.link_style.as_ref()
    }
}

/// Ordered entity rules plus table-wide defaults.
#[derive(Debug, Clone)]
pub struct SchemaTable {
    format: DocumentFormat,
    key: KeySource,
    key_parse: KeyParse,
    node_class: Arc<dyn NodeClass>,
    link_style: Option<Arc<dyn LinkStyle>>,
    renderer: Arc<dyn AttributeRenderer>,
    types: IndexMap<String, Arc<EntityRule>>,
}

impl SchemaTable {
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            key: KeySource::default(),
            key_parse: KeyParse::default(),
            node_class: Arc::new(DefaultNodeClass),
            link_style: None,
            renderer: Arc::new(PlainRenderer::default()),
            types: IndexMap::new(),
        }
    }

    pub fn with_key(mut self, key: KeySource) -> Self {
        self.key = key;
        self
    }

    pub fn with_key_parse(mut self, key_parse: KeyParse) -> Self {
        self.key_parse = key_parse;
        self
    }

    pub fn with_node_class(mut self, class: Arc<dyn NodeClass>) -> Self {
        self.node_class = class;
        self
    }

    pub fn with_link_style(mut self, style: Arc<dyn LinkStyle>) -> Self {
        self.link_style = Some(style);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn AttributeRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Append (or replace) a top-level entity type.
    pub fn with_entity(mut self, type_name: impl Into<String>, rule: EntityRule) -> Self {
        self.types.insert(type_name.into(), Arc::new(rule));
        self
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn key(&self) -> &KeySource {
        &self.key
    }

    pub fn key_parse(&self) -> KeyParse {
        self.key_parse
    }

    pub fn types(&self) -> &IndexMap<String, Arc<EntityRule>> {
        &self.types
    }

    pub fn default_renderer(&self) -> &Arc<dyn AttributeRenderer> {
        &self.renderer
    }

    pub fn key_for<'a>(&'a self, rule: &'a EntityRule) -> &'a KeySource {
        rule.key().unwrap_or(&self.key)
    }

    pub fn node_class_for<'a>(&'a self, rule: &'a EntityRule) -> &'a Arc<dyn NodeClass> {
        rule.node_class().unwrap_or(&self.node_class)
    }

    pub fn link_style_for(&self, rule: &EntityRule) -> Option<Arc<dyn LinkStyle>> {
        rule.link_style().or(self.link_style.as_ref()).cloned()
    }

    /// Every type name the table can produce, parents before their children.
    pub fn all_type_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack: Vec<(&String, &Arc<EntityRule>)> = self.types.iter().rev().collect();
        while let Some((name, rule)) = stack.pop() {
            if !out.contains(&name.as_str()) {
                out.push(name.as_str());
            }
            stack.extend(rule.children().iter().rev());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_overrides_take_precedence_over_table_defaults() {
        let table = SchemaTable::new(DocumentFormat::Xml)
            .with_key(KeySource::Field("ManagedEntityId".into()))
            .with_entity("OntG", EntityRule::new())
            .with_entity("OmciSystem", EntityRule::new().with_key(KeySource::Fixed("0".into())));

        let ont = &table.types()["OntG"];
        let system = &table.types()["OmciSystem"];
        assert_eq!(table.key_for(ont), &KeySource::Field("ManagedEntityId".into()));
        assert_eq!(table.key_for(system), &KeySource::Fixed("0".into()));
    }

    #[test]
    fn all_type_names_walks_nested_rules_in_order() {
        let table = SchemaTable::new(DocumentFormat::Xml)
            .with_entity(
                "forwarder",
                EntityRule::new().with_child("port", EntityRule::new()),
            )
            .with_entity("interface", EntityRule::new());
        assert_eq!(table.all_type_names(), vec!["forwarder", "port", "interface"]);
    }

    #[test]
    fn key_source_deserializes_all_shapes() {
        let field: KeySource = serde_yml::from_str("field: name").expect("field form");
        assert_eq!(field, KeySource::Field("name".into()));
        let name: KeySource = serde_yml::from_str("element_name").expect("unit form");
        assert_eq!(name, KeySource::ElementName);
        let fixed: KeySource = serde_yml::from_str("fixed: \"0\"").expect("fixed form");
        assert_eq!(fixed, KeySource::Fixed("0".into()));

        assert!(serde_yml::from_str::<KeySource>("tag_name").is_err());
        let written = serde_yml::to_string(&KeySource::Field("name".into())).expect("serializes");
        assert_eq!(serde_yml::from_str::<KeySource>(&written).expect("reads back"), KeySource::Field("name".into()));
    }
}
