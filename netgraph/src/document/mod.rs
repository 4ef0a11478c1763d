//! Uniform read access to hierarchical documents.
//!
//! The builder never looks at raw XML or JSON. It asks a [`DocumentAdapter`] to
//! enumerate elements by tag, to read scalar (or multi-valued) fields along a
//! slash-separated path, and to derive natural keys. Elements are addressed by
//! [`ElementId`] handles into the adapter's arena.

pub mod json;
pub mod xml;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error_handler::DocumentError;

pub use json::JsonDocument;
pub use xml::XmlDocument;

/// Declared format of a raw document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Xml,
    Json,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Xml => "xml",
            Self::Json => "json",
        })
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown document format `{other}`")),
        }
    }
}

/// Handle to one element inside a document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u32);

impl ElementId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

/// Result of a path lookup: absent, one scalar, or several scalars in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    #[default]
    Absent,
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn from_values(mut values: Vec<String>) -> Self {
        match values.len() {
            0 => Self::Absent,
            1 => Self::Scalar(values.remove(0)),
            _ => Self::List(values),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Absent => None,
            Self::Scalar(v) => Some(v),
            Self::List(vs) => vs.first().map(String::as_str),
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Absent => Vec::new(),
            Self::Scalar(v) => vec![v],
            Self::List(vs) => vs,
        }
    }
}

/// Read-only view over a parsed document.
pub trait DocumentAdapter: Send + Sync + fmt::Debug {
    fn format(&self) -> DocumentFormat;

    /// Synthetic root that contains the whole document.
    fn root(&self) -> ElementId;

    /// Elements matching `tag` anywhere below `context`, in document order.
    fn enumerate(&self, context: ElementId, tag: &str) -> Vec<ElementId>;

    /// Scalars found along a slash-separated `path` below `context`.
    fn scalar_or_list(&self, context: ElementId, path: &str) -> FieldValue;

    /// `Some(field)`: first value of that field. `None`: the element's own name.
    fn natural_key(&self, element: ElementId, key_field: Option<&str>) -> Option<String>;

    /// Tag (XML), member name or array index (JSON).
    fn name(&self, element: ElementId) -> &str;

    /// Trimmed text content. `None` for composite JSON values and `null`.
    fn text(&self, element: ElementId) -> Option<String>;

    /// Ordered child fields.
    fn children(&self, element: ElementId) -> Vec<ElementId>;

    /// XML element attribute. JSON values have none.
    fn prop(&self, element: ElementId, name: &str) -> Option<&str>;

    fn child_count(&self, element: ElementId) -> usize {
        self.children(element).len()
    }

    fn first_value(&self, context: ElementId, path: &str) -> Option<String> {
        self.scalar_or_list(context, path).into_vec().into_iter().next()
    }
}

/// Parse `raw` with the adapter matching `format`.
///
/// `max_bytes == 0` disables the size limit.
pub fn load(
    raw: &str,
    format: DocumentFormat,
    max_bytes: usize,
) -> Result<Box<dyn DocumentAdapter>, DocumentError> {
    if max_bytes > 0 && raw.len() > max_bytes {
        return Err(DocumentError::TooLarge {
            size: raw.len(),
            limit: max_bytes,
        });
    }
    if raw.trim().is_empty() {
        return Err(DocumentError::Empty);
    }

    Ok(match format {
        DocumentFormat::Xml => Box::new(XmlDocument::parse(raw)?),
        DocumentFormat::Json => Box::new(JsonDocument::parse(raw)?),
    })
}

/// Split a path into non-empty segments.
pub(crate) fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').map(str::trim).filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_rejects_empty_and_oversized() {
        assert!(matches!(
            load("  \n", DocumentFormat::Xml, 0),
            Err(DocumentError::Empty)
        ));
        assert!(matches!(
            load("{\"a\": 1}", DocumentFormat::Json, 4),
            Err(DocumentError::TooLarge { size: 8, limit: 4 })
        ));
    }

    #[test]
    fn field_value_shapes() {
        assert_eq!(FieldValue::from_values(vec![]), FieldValue::Absent);
        assert_eq!(
            FieldValue::from_values(vec!["a".into()]),
            FieldValue::Scalar("a".into())
        );
        let list = FieldValue::from_values(vec!["a".into(), "b".into()]);
        assert_eq!(list.first(), Some("a"));
        assert_eq!(list.into_vec(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("XML".parse::<DocumentFormat>(), Ok(DocumentFormat::Xml));
        assert!("yaml".parse::<DocumentFormat>().is_err());
    }
}
