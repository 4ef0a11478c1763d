//! Name → strategy lookup used when compiling schema definitions.

use std::collections::HashMap;
use std::sync::Arc;

use super::pointer::{TargetHook, TransformHook, ValueHook};
use crate::graph::synthesis::LinkSynthesizer;
use crate::model::attribute::{AttributeRenderer, HexStringRenderer, PlainRenderer};
use crate::model::link::LinkStyle;
use crate::model::node::{DefaultNodeClass, NodeClass};

/// Renderer registered under `plain` (also the table default).
pub const PLAIN_RENDERER: &str = "plain";
/// Plain rendering without the numeric breakdown.
pub const TEXT_RENDERER: &str = "text";
pub const HEX_STRING_RENDERER: &str = "hex_string";
pub const DEFAULT_NODE_CLASS: &str = "default";

#[derive(Debug, Clone, Default)]
pub struct Registry {
    node_classes: HashMap<String, Arc<dyn NodeClass>>,
    renderers: HashMap<String, Arc<dyn AttributeRenderer>>,
    link_styles: HashMap<String, Arc<dyn LinkStyle>>,
    values: HashMap<String, ValueHook>,
    transforms: HashMap<String, TransformHook>,
    targets: HashMap<String, TargetHook>,
    synthesizers: HashMap<String, Arc<dyn LinkSynthesizer>>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the generic strategies.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register_node_class(DEFAULT_NODE_CLASS, Arc::new(DefaultNodeClass))
            .register_renderer(PLAIN_RENDERER, Arc::new(PlainRenderer::default()))
            .register_renderer(TEXT_RENDERER, Arc::new(PlainRenderer::text_only()))
            .register_renderer(HEX_STRING_RENDERER, Arc::new(HexStringRenderer::default()));
        registry
    }

    pub fn register_node_class(&mut self, name: &str, class: Arc<dyn NodeClass>) -> &mut Self {
        self.node_classes.insert(name.to_string(), class);
        self
    }

    pub fn register_renderer(&mut self, name: &str, renderer: Arc<dyn AttributeRenderer>) -> &mut Self {
        self.renderers.insert(name.to_string(), renderer);
        self
    }

    pub fn register_link_style(&mut self, name: &str, style: Arc<dyn LinkStyle>) -> &mut Self {
        self.link_styles.insert(name.to_string(), style);
        self
    }

    pub fn register_value(&mut self, hook: ValueHook) -> &mut Self {
        self.values.insert(hook.name().to_string(), hook);
        self
    }

    pub fn register_transform(&mut self, hook: TransformHook) -> &mut Self {
        self.transforms.insert(hook.name().to_string(), hook);
        self
    }

    pub fn register_target(&mut self, hook: TargetHook) -> &mut Self {
        self.targets.insert(hook.name().to_string(), hook);
        self
    }

    pub fn register_synthesizer(&mut self, synthesizer: Arc<dyn LinkSynthesizer>) -> &mut Self {
        self.synthesizers
            .insert(synthesizer.name().to_string(), synthesizer);
        self
    }

    pub fn node_class(&self, name: &str) -> Option<Arc<dyn NodeClass>> {
        self.node_classes.get(name).cloned()
    }

    pub fn renderer(&self, name: &str) -> Option<Arc<dyn AttributeRenderer>> {
        self.renderers.get(name).cloned()
    }

    pub fn link_style(&self, name: &str) -> Option<Arc<dyn LinkStyle>> {
        self.link_styles.get(name).cloned()
    }

    pub fn value(&self, name: &str) -> Option<ValueHook> {
        self.values.get(name).cloned()
    }

    pub fn transform(&self, name: &str) -> Option<TransformHook> {
        self.transforms.get(name).cloned()
    }

    pub fn target(&self, name: &str) -> Option<TargetHook> {
        self.targets.get(name).cloned()
    }

    pub fn synthesizer(&self, name: &str) -> Option<Arc<dyn LinkSynthesizer>> {
        self.synthesizers.get(name).cloned()
    }
}
