//! Profile loader, validator and compiler.
//!
//! Responsibilities:
//! - Read a YAML profile definition from a string or a file into [`ProfileDef`]
//! - Validate constraints the type system cannot express
//! - Compile the definition against a [`Registry`] into a ready-to-use [`Profile`]

pub mod model;

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::model::{Limits, ProfileDef};
use crate::error_handler::{ConfigError, Result};
use crate::graph::builder::GraphBuilder;
use crate::graph::diagram::Diagram;
use crate::graph::synthesis::LinkSynthesizer;
use crate::graph::views::DisplayProfile;
use crate::model::style::StyleTable;
use crate::schema::{Registry, SchemaTable};

/// Parse and validate a profile definition from YAML text.
pub fn load_profile_from_str(yaml: &str) -> Result<ProfileDef> {
    let def: ProfileDef = serde_yml::from_str(yaml).map_err(ConfigError::from)?;
    validate(&def)?;
    Ok(def)
}

/// Read, parse and validate a profile definition file.
pub fn load_profile_from_path(path: &Path) -> Result<ProfileDef> {
    let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_profile_from_str(&yaml)
}

/// Basic definition validation.
fn validate(def: &ProfileDef) -> std::result::Result<(), ConfigError> {
    if def.name.trim().is_empty() {
        return Err(ConfigError::Invalid("`name` must not be empty".into()));
    }
    if def.schema.types.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "profile `{}` declares no entity types",
            def.name
        )));
    }
    if def.limits.max_document_bytes == 0 {
        return Err(ConfigError::Invalid(
            "`max_document_bytes` must be greater than 0".into(),
        ));
    }

    let mut known: Vec<&str> = Vec::new();
    let mut stack: Vec<_> = def.schema.types.iter().collect();
    while let Some((name, entity)) = stack.pop() {
        known.push(name);
        stack.extend(entity.children.iter());
    }
    for anchor in def.display.anchors.keys() {
        if !known.contains(&anchor.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "display anchor `{anchor}` is not an entity type"
            )));
        }
    }
    for (view, kinds) in &def.display.link_views {
        if kinds.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "link view `{view}` lists no link kinds"
            )));
        }
    }
    Ok(())
}

/// Everything needed to turn raw documents of one device family into diagrams.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub schema: Arc<SchemaTable>,
    pub styles: Arc<StyleTable>,
    pub display: DisplayProfile,
    pub synthesizers: Vec<Arc<dyn LinkSynthesizer>>,
    pub limits: Limits,
}

impl Profile {
    /// Resolve every strategy name of `def` against `registry`.
    ///
    /// Unknown synthesizer names are skipped with a warning, like unknown
    /// renderers and node classes; unknown pointer hooks are errors.
    pub fn compile(def: &ProfileDef, registry: &Registry) -> Result<Self> {
        let schema = SchemaTable::compile(&def.schema, registry)?;

        let synthesizers = def
            .synthesizers
            .iter()
            .filter_map(|name| {
                let found = registry.synthesizer(name);
                if found.is_none() {
                    warn!(profile = %def.name, synthesizer = %name, "unknown synthesizer skipped");
                }
                found
            })
            .collect();

        info!(
            profile = %def.name,
            types = schema.types().len(),
            styles = def.styles.len(),
            anchors = def.display.anchors.len(),
            "profile compiled"
        );

        Ok(Self {
            name: def.name.clone(),
            schema: Arc::new(schema),
            styles: Arc::new(def.styles.clone()),
            display: def.display.clone(),
            synthesizers,
            limits: def.limits.clone(),
        })
    }

    pub fn builder(&self) -> GraphBuilder {
        GraphBuilder::new(Arc::clone(&self.schema))
            .with_styles(Arc::clone(&self.styles))
            .with_limits(self.limits.clone())
    }

    /// Build a diagram from `raw` and run the profile's synthesizers on it.
    pub fn parse(&self, raw: &str) -> Result<Diagram> {
        let mut diagram = self.builder().parse(raw)?;
        if !self.synthesizers.is_empty() {
            diagram.synthesize(&self.synthesizers);
        }
        Ok(diagram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::NetGraphError;
    use crate::schema::KeySource;

    const MINIMAL: &str = r#"
name: demo
schema:
  format: xml
  key: { field: id }
  types:
    A:
      links:
        - { from: ref, to: id, target: B }
    B: {}
display:
  anchors:
    A: {}
"#;

    #[test]
    fn minimal_profile_loads_and_compiles() {
        let def = load_profile_from_str(MINIMAL).expect("valid profile");
        assert_eq!(def.schema.types.len(), 2);
        let profile = Profile::compile(&def, &Registry::with_builtins()).expect("compiles");
        assert_eq!(profile.name, "demo");
        assert!(profile.synthesizers.is_empty());
    }

    #[test]
    fn key_sources_load_in_map_form() {
        let yaml = MINIMAL.replace("    B: {}\n", "    B:\n      key: { fixed: \"0\" }\n");
        let def = load_profile_from_str(&yaml).expect("map-form keys");
        assert_eq!(def.schema.key, KeySource::Field("id".into()));
        assert_eq!(def.schema.types["B"].key, Some(KeySource::Fixed("0".into())));
        assert_eq!(def.schema.types["A"].key, None);

        let bad = MINIMAL.replace("key: { field: id }", "key: node_name");
        assert!(matches!(
            load_profile_from_str(&bad).expect_err("unknown key source"),
            NetGraphError::Config(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn unknown_anchor_is_rejected() {
        let yaml = MINIMAL.replace("    A: {}\n", "    C: {}\n");
        let err = load_profile_from_str(&yaml).expect_err("anchor C does not exist");
        assert!(matches!(err, NetGraphError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let yaml = format!("{MINIMAL}limits:\n  max_document_bytes: 0\n");
        assert!(load_profile_from_str(&yaml).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_profile_from_path(Path::new("/definitely/not/here.yaml"))
            .expect_err("missing file");
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }

    #[test]
    fn syntax_errors_surface_as_yaml_errors() {
        let err = load_profile_from_str("name: [").expect_err("broken yaml");
        assert!(matches!(err, NetGraphError::Config(ConfigError::Yaml(_))));
    }
}
