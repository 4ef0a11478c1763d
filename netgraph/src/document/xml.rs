//! Element-tree adapter built on the `quick-xml` event reader.
//!
//! The whole document is read into an arena of elements up front; path and tag
//! lookups then match descendants at any depth, the same way
//! `getElementsByTagName` does on a DOM tree.

use std::fmt;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{DocumentAdapter, DocumentFormat, ElementId, FieldValue, path_segments};
use crate::error_handler::DocumentError;

const ROOT_NAME: &str = "#document";

#[derive(Debug)]
enum Content {
    Text(String),
    Element(ElementId),
}

#[derive(Debug)]
struct XmlElement {
    name: String,
    props: Vec<(String, String)>,
    content: Vec<Content>,
    children: Vec<ElementId>,
}

impl XmlElement {
    fn new(name: String, props: Vec<(String, String)>) -> Self {
        Self {
            name,
            props,
            content: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// Parsed XML document.
#[derive(Debug)]
pub struct XmlDocument {
    elements: Vec<XmlElement>,
}

impl XmlDocument {
    pub fn parse(raw: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_str(raw);
        // Whitespace-only text between elements is skipped manually below.

        let mut elements = vec![XmlElement::new(ROOT_NAME.to_string(), Vec::new())];
        let mut open: Vec<ElementId> = vec![ElementId(0)];

        loop {
            let position = reader.buffer_position() as u64;
            let event = reader
                .read_event()
                .map_err(|e| malformed(reader.buffer_position() as u64, e))?;

            match event {
                Event::Start(e) => {
                    let id = push_element(&mut elements, &open, &e, position)?;
                    open.push(id);
                }
                Event::Empty(e) => {
                    push_element(&mut elements, &open, &e, position)?;
                }
                Event::End(_) => {
                    if open.len() <= 1 {
                        return Err(malformed(position, "closing tag without opening tag"));
                    }
                    open.pop();
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| malformed(position, e))?;
                    if !text.trim().is_empty() {
                        push_text(&mut elements, &open, text.into_owned());
                    }
                }
                Event::CData(c) => {
                    let text = String::from_utf8_lossy(&c).into_owned();
                    push_text(&mut elements, &open, text);
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype.
                _ => {}
            }
        }

        if let Some(unclosed) = open.get(1) {
            return Err(malformed(
                raw.len() as u64,
                format!("unclosed element <{}>", elements[unclosed.index()].name),
            ));
        }
        if elements[0].children.is_empty() {
            return Err(malformed(0, "no root element"));
        }

        Ok(Self { elements })
    }

    fn element(&self, id: ElementId) -> &XmlElement {
        &self.elements[id.index()]
    }

    /// Descendants of `context` (excluding itself) named `tag`, pre-order.
    fn descendants_named(&self, context: ElementId, tag: &str) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.element(context).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let el = self.element(id);
            if el.name == tag {
                out.push(id);
            }
            stack.extend(el.children.iter().rev().copied());
        }
        out
    }

    /// Concatenated text of the element and all its descendants.
    fn text_content(&self, id: ElementId) -> String {
        let mut out = String::new();
        let mut stack: Vec<&Content> = self.element(id).content.iter().rev().collect();
        while let Some(item) = stack.pop() {
            match item {
                Content::Text(t) => out.push_str(t),
                Content::Element(child) => {
                    stack.extend(self.element(*child).content.iter().rev());
                }
            }
        }
        out
    }

    fn collect_path(&self, context: ElementId, segments: &[&str], out: &mut Vec<String>) {
        let Some((head, rest)) = segments.split_first() else {
            return;
        };
        for found in self.descendants_named(context, head) {
            if rest.is_empty() {
                out.push(self.text_content(found).trim().to_string());
            } else {
                self.collect_path(found, rest, out);
            }
        }
    }
}

impl DocumentAdapter for XmlDocument {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Xml
    }

    fn root(&self) -> ElementId {
        ElementId(0)
    }

    fn enumerate(&self, context: ElementId, tag: &str) -> Vec<ElementId> {
        self.descendants_named(context, tag)
    }

    fn scalar_or_list(&self, context: ElementId, path: &str) -> FieldValue {
        let segments = path_segments(path);
        let mut values = Vec::new();
        self.collect_path(context, &segments, &mut values);
        FieldValue::from_values(values)
    }

    fn natural_key(&self, element: ElementId, key_field: Option<&str>) -> Option<String> {
        match key_field {
            Some(field) => self.first_value(element, field),
            None => Some(self.element(element).name.clone()),
        }
    }

    fn name(&self, element: ElementId) -> &str {
        &self.element(element).name
    }

    fn text(&self, element: ElementId) -> Option<String> {
        Some(self.text_content(element).trim().to_string())
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.element(element).children.clone()
    }

    fn prop(&self, element: ElementId, name: &str) -> Option<&str> {
        self.element(element)
            .props
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn child_count(&self, element: ElementId) -> usize {
        self.element(element).children.len()
    }
}

fn push_element(
    elements: &mut Vec<XmlElement>,
    open: &[ElementId],
    start: &BytesStart<'_>,
    position: u64,
) -> Result<ElementId, DocumentError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

    let mut props = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(position, e))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| malformed(position, e))?;
        props.push((key, value.into_owned()));
    }

    let id = ElementId::from_index(elements.len());
    elements.push(XmlElement::new(name, props));

    // `open` always holds at least the synthetic root.
    if let Some(parent) = open.last() {
        let parent = &mut elements[parent.index()];
        parent.children.push(id);
        parent.content.push(Content::Element(id));
    }
    Ok(id)
}

fn push_text(elements: &mut [XmlElement], open: &[ElementId], text: String) {
    if let Some(current) = open.last() {
        elements[current.index()].content.push(Content::Text(text));
    }
}

fn malformed(position: u64, reason: impl fmt::Display) -> DocumentError {
    DocumentError::Xml {
        position,
        reason: reason.to_string(),
    }
}
