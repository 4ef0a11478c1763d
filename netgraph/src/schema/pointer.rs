//! Cross-reference rules and their evaluation against one element.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::model::link::LinkKind;
use crate::model::node::ElementView;

/* ------------------------------------------------------------------------- */
/* Hooks                                                                     */
/* ------------------------------------------------------------------------- */

pub type ValueFn = dyn Fn(ElementView<'_>, Option<&str>) -> Option<String> + Send + Sync;
pub type TransformFn = dyn Fn(&str) -> Option<String> + Send + Sync;
pub type TargetFn = dyn Fn(ElementView<'_>, Option<&str>) -> Option<TargetTypes> + Send + Sync;

/// Named function hook; the name is kept for diagnostics.
pub struct Hook<F: ?Sized> {
    name: Arc<str>,
    func: Arc<F>,
}

impl<F: ?Sized> Hook<F> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<F: ?Sized> Clone for Hook<F> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            func: Arc::clone(&self.func),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Hook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hook").field(&self.name).finish()
    }
}

/// Computes a single pointer value from the source element and the `from` path.
pub type ValueHook = Hook<ValueFn>;
/// Rewrites each raw value read from the `from` path.
pub type TransformHook = Hook<TransformFn>;
/// Computes candidate target types from the source element.
pub type TargetHook = Hook<TargetFn>;

impl Hook<ValueFn> {
    pub fn new(
        name: &str,
        func: impl Fn(ElementView<'_>, Option<&str>) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn call(&self, element: ElementView<'_>, from: Option<&str>) -> Option<String> {
        (self.func)(element, from)
    }
}

impl Hook<TransformFn> {
    pub fn new(name: &str, func: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn call(&self, raw: &str) -> Option<String> {
        (self.func)(raw)
    }
}

impl Hook<TargetFn> {
    pub fn new(
        name: &str,
        func: impl Fn(ElementView<'_>, Option<&str>) -> Option<TargetTypes> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn call(&self, element: ElementView<'_>, from: Option<&str>) -> Option<TargetTypes> {
        (self.func)(element, from)
    }
}

/* ------------------------------------------------------------------------- */
/* Pointer specs                                                             */
/* ------------------------------------------------------------------------- */

/// Ordered candidate target types; the first one holding a match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetTypes(Vec<String>);

impl TargetTypes {
    /// Parse `"A|B"`; blanks are trimmed and empty entries dropped.
    pub fn parse(spec: &str) -> Self {
        Self(
            spec.split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<&str> for TargetTypes {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl<S: AsRef<str>> FromIterator<S> for TargetTypes {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .flat_map(|s| Self::parse(s.as_ref()).0)
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub enum TargetRule {
    Fixed(TargetTypes),
    Computed(TargetHook),
    /// Read an enum field and map its value to types or to nested pointers.
    FieldMap {
        field: String,
        map: IndexMap<String, MapTarget>,
    },
}

#[derive(Debug, Clone)]
pub enum MapTarget {
    Types(TargetTypes),
    /// Evaluated in place against the same element.
    Specs(Vec<PointerSpec>),
}

#[derive(Debug, Clone)]
pub enum ValueRule {
    /// Values found at `from`.
    Path,
    Transform(TransformHook),
    Computed(ValueHook),
    Constant(String),
}

/// One declared cross-reference rule.
#[derive(Debug, Clone)]
pub struct PointerSpec {
    pub from: Option<String>,
    /// Field matched on candidates; their natural key when `None`.
    pub to: Option<String>,
    pub target: TargetRule,
    pub value: ValueRule,
    pub note: Option<String>,
    pub kind: LinkKind,
}

impl PointerSpec {
    pub fn new(target: TargetRule, value: ValueRule) -> Self {
        Self {
            from: None,
            to: None,
            target,
            value,
            note: None,
            kind: LinkKind::Reference,
        }
    }

    /// Values read from `from`, matched against fixed `target` types.
    pub fn field(from: &str, target: impl Into<TargetTypes>) -> Self {
        Self::new(TargetRule::Fixed(target.into()), ValueRule::Path).with_from(from)
    }

    pub fn with_from(mut self, from: &str) -> Self {
        self.from = Some(from.to_string());
        self
    }

    pub fn with_to(mut self, to: &str) -> Self {
        self.to = Some(to.to_string());
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    pub fn with_kind(mut self, kind: LinkKind) -> Self {
        self.kind = kind;
        self
    }

    fn values(&self, element: ElementView<'_>) -> Vec<String> {
        let from = self.from.as_deref();
        match &self.value {
            ValueRule::Path => from.map(|p| element.values(p)).unwrap_or_default(),
            ValueRule::Transform(hook) => from
                .map(|p| element.values(p))
                .unwrap_or_default()
                .iter()
                .filter_map(|raw| hook.call(raw))
                .collect(),
            ValueRule::Computed(hook) => hook.call(element, from).into_iter().collect(),
            ValueRule::Constant(value) => vec![value.clone()],
        }
    }

    fn targets<'a>(&'a self, element: ElementView<'_>) -> Option<Targets<'a>> {
        match &self.target {
            TargetRule::Fixed(types) => Some(Targets::Types(types.clone())),
            TargetRule::Computed(hook) => hook
                .call(element, self.from.as_deref())
                .map(Targets::Types),
            TargetRule::FieldMap { field, map } => {
                let selector = element.field(field)?;
                match map.get(&selector)? {
                    MapTarget::Types(types) => Some(Targets::Types(types.clone())),
                    MapTarget::Specs(specs) => Some(Targets::Nested(specs)),
                }
            }
        }
    }
}

enum Targets<'a> {
    Types(TargetTypes),
    Nested(&'a [PointerSpec]),
}

/// A pointer spec evaluated against one source element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPointer {
    pub from_label: String,
    pub to_field: Option<String>,
    pub candidates: TargetTypes,
    pub values: Vec<String>,
    pub note: Option<String>,
    pub kind: LinkKind,
}

/// Evaluate `specs` in declaration order, expanding nested field-map specs in place.
pub fn collect_pointers(specs: &[PointerSpec], element: ElementView<'_>, out: &mut Vec<ResolvedPointer>) {
    for spec in specs {
        match spec.targets(element) {
            None => continue,
            Some(Targets::Nested(nested)) => collect_pointers(nested, element, out),
            Some(Targets::Types(candidates)) => {
                if candidates.is_empty() {
                    continue;
                }
                out.push(ResolvedPointer {
                    from_label: spec.from.clone().unwrap_or_default(),
                    to_field: spec.to.clone(),
                    candidates,
                    values: spec.values(element),
                    note: spec.note.clone(),
                    kind: spec.kind,
                });
            }
        }
    }
}
