//! Definition → runtime schema compilation.

use indexmap::IndexMap;
use tracing::warn;

use super::pointer::{MapTarget, PointerSpec, TargetRule, ValueRule};
use super::registry::Registry;
use super::{EntityRule, SchemaTable};
use crate::config::model::{AttrOverrideDef, EntityDef, MapEntryDef, PointerDef, SchemaDef};
use crate::error_handler::SchemaError;
use crate::model::attribute::{AttrOverride, AttrOverrides};

impl SchemaTable {
    /// Resolve every name in `def` against `registry`.
    ///
    /// Unknown renderer, node-class and link-style names fall back to the
    /// defaults with a warning. Unknown pointer hooks and inconsistent
    /// pointer definitions are errors.
    pub fn compile(def: &SchemaDef, registry: &Registry) -> Result<Self, SchemaError> {
        let mut table = SchemaTable::new(def.format)
            .with_key(def.key.clone())
            .with_key_parse(def.key_parse);

        if let Some(class) = lookup(def.node_class.as_deref(), "node class", |n| registry.node_class(n)) {
            table = table.with_node_class(class);
        }
        if let Some(style) = lookup(def.link_style.as_deref(), "link style", |n| registry.link_style(n)) {
            table = table.with_link_style(style);
        }
        if let Some(renderer) = lookup(def.attribute_renderer.as_deref(), "renderer", |n| {
            registry.renderer(n)
        }) {
            table = table.with_renderer(renderer);
        }

        for (type_name, entity) in &def.types {
            table = table.with_entity(type_name.clone(), compile_entity(type_name, entity, registry)?);
        }
        Ok(table)
    }
}

fn lookup<T>(name: Option<&str>, what: &str, find: impl Fn(&str) -> Option<T>) -> Option<T> {
    let name = name?;
    let found = find(name);
    if found.is_none() {
        warn!(name, kind = what, "unknown {what}, using the default");
    }
    found
}

fn compile_entity(type_name: &str, def: &EntityDef, registry: &Registry) -> Result<EntityRule, SchemaError> {
    if type_name.trim().is_empty() {
        return Err(SchemaError::EmptyTypeName);
    }

    let mut rule = EntityRule::new().with_attributes(compile_overrides(&def.attributes, registry));
    if let Some(class) = lookup(def.node_class.as_deref(), "node class", |n| registry.node_class(n)) {
        rule = rule.with_node_class(class);
    }
    if let Some(style) = lookup(def.link_style.as_deref(), "link style", |n| registry.link_style(n)) {
        rule = rule.with_link_style(style);
    }
    if let Some(key) = &def.key {
        rule = rule.with_key(key.clone());
    }
    for (index, pointer) in def.links.iter().enumerate() {
        rule = rule.with_link(compile_pointer(type_name, index, pointer, registry)?);
    }
    for (child_name, child) in &def.children {
        rule = rule.with_child(child_name.clone(), compile_entity(child_name, child, registry)?);
    }
    Ok(rule)
}

fn compile_overrides(defs: &IndexMap<String, AttrOverrideDef>, registry: &Registry) -> AttrOverrides {
    defs.iter().fold(AttrOverrides::new(), |acc, (name, def)| match def {
        AttrOverrideDef::Renderer(renderer) => {
            match lookup(Some(renderer.as_str()), "renderer", |n| registry.renderer(n)) {
                Some(r) => acc.with(name.clone(), AttrOverride::Renderer(r)),
                None => acc,
            }
        }
        AttrOverrideDef::Nested(nested) => acc.with(
            name.clone(),
            AttrOverride::Nested(compile_overrides(nested, registry)),
        ),
    })
}

fn compile_pointer(
    type_name: &str,
    index: usize,
    def: &PointerDef,
    registry: &Registry,
) -> Result<PointerSpec, SchemaError> {
    let at = || (type_name.to_string(), index);

    let target_strategies = [
        def.target.is_some(),
        def.target_fn.is_some(),
        def.target_map.is_some(),
    ]
    .into_iter()
    .filter(|set| *set)
    .count();
    match target_strategies {
        0 => {
            let (type_name, index) = at();
            return Err(SchemaError::MissingTarget { type_name, index });
        }
        1 => {}
        _ => {
            let (type_name, index) = at();
            return Err(SchemaError::AmbiguousTarget { type_name, index });
        }
    }

    let value_strategies = [def.value.is_some(), def.value_fn.is_some(), def.transform.is_some()]
        .into_iter()
        .filter(|set| *set)
        .count();
    if value_strategies > 1 {
        let (type_name, index) = at();
        return Err(SchemaError::AmbiguousValue { type_name, index });
    }
    // A field map may carry no value of its own when every entry is a nested list.
    if value_strategies == 0 && def.from.is_none() && def.target_map.is_none() {
        let (type_name, index) = at();
        return Err(SchemaError::MissingValue { type_name, index });
    }
    if def.transform.is_some() && def.from.is_none() {
        let (type_name, index) = at();
        return Err(SchemaError::TransformWithoutPath { type_name, index });
    }

    let unknown = |kind: &'static str, name: &str| SchemaError::UnknownHook {
        type_name: type_name.to_string(),
        kind,
        name: name.to_string(),
    };

    let target = if let Some(t) = &def.target {
        TargetRule::Fixed(t.to_types())
    } else if let Some(name) = &def.target_fn {
        TargetRule::Computed(registry.target(name).ok_or_else(|| unknown("target", name))?)
    } else if let Some(map_def) = &def.target_map {
        let mut map = IndexMap::with_capacity(map_def.map.len());
        for (selector, entry) in &map_def.map {
            let target = match entry {
                MapEntryDef::Types(t) => MapTarget::Types(t.to_types()),
                MapEntryDef::Specs(specs) => MapTarget::Specs(
                    specs
                        .iter()
                        .map(|s| compile_pointer(type_name, index, s, registry))
                        .collect::<Result<_, _>>()?,
                ),
            };
            map.insert(selector.clone(), target);
        }
        TargetRule::FieldMap {
            field: map_def.field.clone(),
            map,
        }
    } else {
        let (type_name, index) = at();
        return Err(SchemaError::MissingTarget { type_name, index });
    };

    let value = if let Some(v) = &def.value {
        ValueRule::Constant(v.to_string())
    } else if let Some(name) = &def.value_fn {
        ValueRule::Computed(registry.value(name).ok_or_else(|| unknown("value", name))?)
    } else if let Some(name) = &def.transform {
        ValueRule::Transform(registry.transform(name).ok_or_else(|| unknown("transform", name))?)
    } else {
        ValueRule::Path
    };

    Ok(PointerSpec {
        from: def.from.clone(),
        to: def.to.clone(),
        target,
        value,
        note: def.note.clone(),
        kind: def.kind.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{TargetDef, TargetMapDef};
    use crate::document::DocumentFormat;
    use crate::schema::TargetTypes;

    fn schema(types: IndexMap<String, EntityDef>) -> SchemaDef {
        SchemaDef {
            format: DocumentFormat::Xml,
            key: Default::default(),
            key_parse: Default::default(),
            node_class: None,
            link_style: None,
            attribute_renderer: Some("does_not_exist".into()),
            types,
        }
    }

    fn entity(links: Vec<PointerDef>) -> EntityDef {
        EntityDef {
            links,
            ..EntityDef::default()
        }
    }

    fn compile_one(pointer: PointerDef) -> Result<SchemaTable, SchemaError> {
        let types = [("A".to_string(), entity(vec![pointer]))].into_iter().collect();
        SchemaTable::compile(&schema(types), &Registry::with_builtins())
    }

    #[test]
    fn fixed_target_lists_compile_in_order() {
        let table = compile_one(PointerDef {
            from: Some("ref".into()),
            target: Some(TargetDef::Many(vec!["B|C".into(), "D".into()])),
            ..PointerDef::default()
        })
        .expect("compiles");
        let spec = &table.types()["A"].links()[0];
        match &spec.target {
            TargetRule::Fixed(types) => {
                assert_eq!(types, &["B", "C", "D"].into_iter().collect::<TargetTypes>())
            }
            other => panic!("unexpected target {other:?}"),
        }
        assert!(matches!(spec.value, ValueRule::Path));
    }

    #[test]
    fn inconsistent_pointers_are_rejected() {
        let err = compile_one(PointerDef {
            from: Some("ref".into()),
            ..PointerDef::default()
        })
        .expect_err("no target");
        assert!(matches!(err, SchemaError::MissingTarget { index: 0, .. }));

        let err = compile_one(PointerDef {
            from: Some("ref".into()),
            target: Some(TargetDef::One("B".into())),
            target_fn: Some("x".into()),
            ..PointerDef::default()
        })
        .expect_err("two targets");
        assert!(matches!(err, SchemaError::AmbiguousTarget { .. }));

        let err = compile_one(PointerDef {
            target: Some(TargetDef::One("B".into())),
            transform: Some("x".into()),
            ..PointerDef::default()
        })
        .expect_err("transform without from");
        assert!(matches!(err, SchemaError::TransformWithoutPath { .. }));

        let err = compile_one(PointerDef {
            target: Some(TargetDef::One("B".into())),
            ..PointerDef::default()
        })
        .expect_err("no value");
        assert!(matches!(err, SchemaError::MissingValue { .. }));

        let err = compile_one(PointerDef {
            target: Some(TargetDef::One("B".into())),
            value: Some("1".into()),
            value_fn: Some("x".into()),
            ..PointerDef::default()
        })
        .expect_err("two values");
        assert!(matches!(err, SchemaError::AmbiguousValue { .. }));
    }

    #[test]
    fn unknown_hooks_are_errors_but_unknown_renderers_fall_back() {
        let err = compile_one(PointerDef {
            from: Some("ref".into()),
            target_fn: Some("nope".into()),
            ..PointerDef::default()
        })
        .expect_err("unknown target hook");
        assert!(matches!(err, SchemaError::UnknownHook { kind: "target", .. }));

        let mut def = entity(vec![]);
        def.attributes.insert("Name".into(), AttrOverrideDef::Renderer("missing".into()));
        def.attributes.insert(
            "Stats".into(),
            AttrOverrideDef::Nested([("passed".to_string(), AttrOverrideDef::Renderer("text".into()))].into_iter().collect()),
        );
        let types = [("A".to_string(), def)].into_iter().collect();
        let table = SchemaTable::compile(&schema(types), &Registry::with_builtins()).expect("compiles");
        let attrs = table.types()["A"].attributes();
        assert!(attrs.get("Name").is_none());
        assert!(matches!(attrs.get("Stats"), Some(AttrOverride::Nested(n)) if n.len() == 1));
    }

    #[test]
    fn nested_map_specs_compile_recursively() {
        let table = compile_one(PointerDef {
            target_map: Some(TargetMapDef {
                field: "AssociationType".into(),
                map: [(
                    "2".to_string(),
                    MapEntryDef::Specs(vec![PointerDef {
                        from: Some("AssociatedMePointer".into()),
                        target: Some(TargetDef::One("PptpEthernetUni".into())),
                        ..PointerDef::default()
                    }]),
                )]
                .into_iter()
                .collect(),
            }),
            ..PointerDef::default()
        })
        .expect("compiles");
        let spec = &table.types()["A"].links()[0];
        let TargetRule::FieldMap { field, map } = &spec.target else {
            panic!("expected a field map");
        };
        assert_eq!(field, "AssociationType");
        assert!(matches!(&map["2"], MapTarget::Specs(specs) if specs.len() == 1));
    }

    #[test]
    fn empty_type_names_are_rejected() {
        let types = [(" ".to_string(), EntityDef::default())].into_iter().collect();
        assert!(matches!(
            SchemaTable::compile(&schema(types), &Registry::with_builtins()),
            Err(SchemaError::EmptyTypeName)
        ));
    }
}
