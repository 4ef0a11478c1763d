//! Nested-object adapter for loosely formatted JSON dumps.
//!
//! Device dumps are often emitted by hand-written printers that leave a comma
//! before the closing bracket. Those trailing commas are stripped before the
//! text is handed to `serde_json`; anything else must be valid JSON.

use serde_json::Value;

use super::{DocumentAdapter, DocumentFormat, ElementId, FieldValue, path_segments};
use crate::error_handler::DocumentError;

const ROOT_NAME: &str = "#document";

#[derive(Debug)]
enum JsonKind {
    Object,
    Array,
    Scalar(String),
    Null,
}

#[derive(Debug)]
struct JsonEntry {
    name: String,
    kind: JsonKind,
    children: Vec<ElementId>,
}

/// Parsed JSON document.
#[derive(Debug)]
pub struct JsonDocument {
    entries: Vec<JsonEntry>,
}

impl JsonDocument {
    pub fn parse(raw: &str) -> Result<Self, DocumentError> {
        let cleaned = strip_trailing_commas(raw);
        let value: Value = serde_json::from_str(&cleaned)?;

        let mut doc = Self {
            entries: Vec::new(),
        };
        doc.insert(ROOT_NAME.to_string(), value);
        Ok(doc)
    }

    fn insert(&mut self, name: String, value: Value) -> ElementId {
        let id = ElementId::from_index(self.entries.len());
        let (kind, members): (JsonKind, Vec<(String, Value)>) = match value {
            Value::Object(map) => (JsonKind::Object, map.into_iter().collect()),
            Value::Array(items) => (
                JsonKind::Array,
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect(),
            ),
            Value::Null => (JsonKind::Null, Vec::new()),
            Value::String(s) => (JsonKind::Scalar(s), Vec::new()),
            Value::Bool(b) => (JsonKind::Scalar(b.to_string()), Vec::new()),
            Value::Number(n) => (JsonKind::Scalar(n.to_string()), Vec::new()),
        };
        self.entries.push(JsonEntry {
            name,
            kind,
            children: Vec::new(),
        });

        let children: Vec<ElementId> = members
            .into_iter()
            .map(|(name, value)| self.insert(name, value))
            .collect();
        self.entries[id.index()].children = children;
        id
    }

    fn entry(&self, id: ElementId) -> &JsonEntry {
        &self.entries[id.index()]
    }

    fn member(&self, id: ElementId, name: &str) -> Option<ElementId> {
        let entry = self.entry(id);
        if !matches!(entry.kind, JsonKind::Object) {
            return None;
        }
        entry
            .children
            .iter()
            .copied()
            .find(|c| self.entry(*c).name == name)
    }

    /// Arrays stand for their items; anything else for itself.
    fn fan_out(&self, id: ElementId, out: &mut Vec<ElementId>) {
        match self.entry(id).kind {
            JsonKind::Array => out.extend(self.entry(id).children.iter().copied()),
            _ => out.push(id),
        }
    }

    fn is_keyed_collection(&self, id: ElementId) -> bool {
        let entry = self.entry(id);
        !entry.children.is_empty()
            && entry
                .children
                .iter()
                .all(|c| matches!(self.entry(*c).kind, JsonKind::Object))
    }

    fn is_object_member(&self, parent: ElementId) -> bool {
        matches!(self.entry(parent).kind, JsonKind::Object)
    }
}

impl DocumentAdapter for JsonDocument {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Json
    }

    fn root(&self) -> ElementId {
        ElementId(0)
    }

    fn enumerate(&self, context: ElementId, tag: &str) -> Vec<ElementId> {
        let mut out = Vec::new();
        // (entry, parent) pairs; array items are never matched by name.
        let mut stack: Vec<(ElementId, ElementId)> = self
            .entry(context)
            .children
            .iter()
            .rev()
            .map(|c| (*c, context))
            .collect();

        while let Some((id, parent)) = stack.pop() {
            let entry = self.entry(id);
            if entry.name == tag && self.is_object_member(parent) {
                match entry.kind {
                    JsonKind::Array => out.extend(entry.children.iter().copied()),
                    JsonKind::Object if self.is_keyed_collection(id) => {
                        out.extend(entry.children.iter().copied())
                    }
                    JsonKind::Object => out.push(id),
                    JsonKind::Scalar(_) | JsonKind::Null => {}
                }
            }
            stack.extend(entry.children.iter().rev().map(|c| (*c, id)));
        }
        out
    }

    fn scalar_or_list(&self, context: ElementId, path: &str) -> FieldValue {
        let segments = path_segments(path);
        if segments.is_empty() {
            return FieldValue::Absent;
        }

        let mut frontier = vec![context];
        for segment in segments {
            let mut expanded = Vec::new();
            for id in frontier {
                self.fan_out(id, &mut expanded);
            }
            frontier = expanded
                .into_iter()
                .filter_map(|id| self.member(id, segment))
                .collect();
        }

        let mut leaves = Vec::new();
        for id in frontier {
            self.fan_out(id, &mut leaves);
        }
        let values = leaves
            .into_iter()
            .filter_map(|id| match &self.entry(id).kind {
                JsonKind::Scalar(s) => Some(s.trim().to_string()),
                _ => None,
            })
            .collect();
        FieldValue::from_values(values)
    }

    fn natural_key(&self, element: ElementId, key_field: Option<&str>) -> Option<String> {
        match key_field {
            Some(field) => self.first_value(element, field),
            None => Some(self.entry(element).name.clone()),
        }
    }

    fn name(&self, element: ElementId) -> &str {
        &self.entry(element).name
    }

    fn text(&self, element: ElementId) -> Option<String> {
        match &self.entry(element).kind {
            JsonKind::Scalar(s) => Some(s.trim().to_string()),
            _ => None,
        }
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.entry(element).children.clone()
    }

    fn prop(&self, _element: ElementId, _name: &str) -> Option<&str> {
        None
    }

    fn child_count(&self, element: ElementId) -> usize {
        self.entry(element).children.len()
    }
}

/// Drop commas that directly precede `}` or `]` (ignoring whitespace),
/// leaving string literals untouched.
pub(crate) fn strip_trailing_commas(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in raw.char_indices() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            ',' => {
                let next = bytes[i + 1..]
                    .iter()
                    .find(|b| !b.is_ascii_whitespace())
                    .copied();
                if !matches!(next, Some(b'}') | Some(b']')) {
                    out.push(ch);
                }
            }
            _ => out.push(ch),
        }
    }
    out
}
