//! Parsed `RunParameters.xml` descriptors.
//!
//! The instrument writes a loosely structured XML document whose shape varies
//! between instrument generations. It is converted into a generic
//! [`serde_json::Value`] tree and queried through optional-path accessors, so a
//! missing field is always a `None` and never an error.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};

use crate::error::{NotReady, Result, RunfolderError};

/// Accepted descriptor file names, in lookup order.
pub const DESCRIPTOR_FILE_NAMES: [&str; 2] = ["RunParameters.xml", "runParameters.xml"];

const ROOT_ELEMENT: &str = "RunParameters";

/// Field tree of a runfolder's descriptor, rooted below `<RunParameters>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDescriptor {
    fields: Value,
}

impl RunDescriptor {
    /// Parses descriptor XML. A document with another root element yields an
    /// empty descriptor.
    ///
    /// # Errors
    ///
    /// Returns the parser error for malformed XML.
    pub fn parse(xml: &str) -> core::result::Result<Self, roxmltree::Error> {
        let doc = roxmltree::Document::parse(xml.trim_start_matches('\u{feff}'))?;
        let root = doc.root_element();
        let fields = if root.tag_name().name() == ROOT_ELEMENT {
            element_to_value(root)
        } else {
            Value::Null
        };
        Ok(Self { fields })
    }

    /// Finds the first accepted descriptor file inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`NotReady::NoDescriptor`] when none of the accepted names exist.
    pub fn locate(dir: &Path) -> core::result::Result<PathBuf, NotReady> {
        DESCRIPTOR_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| NotReady::NoDescriptor {
                path: dir.to_path_buf(),
                tried: DESCRIPTOR_FILE_NAMES.join(", "),
            })
    }

    /// Reads and parses the descriptor at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not well-formed XML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| RunfolderError::io(path, e))?;
        Self::parse(&content).map_err(|source| RunfolderError::Descriptor {
            path: path.to_path_buf(),
            source,
        })
    }

    /// True when the descriptor carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self.fields {
            Value::Null => true,
            Value::String(ref s) => s.trim().is_empty(),
            Value::Object(ref map) => map.is_empty(),
            _ => false,
        }
    }

    /// Value at `path`, walking nested elements by tag name.
    #[must_use]
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        lookup(&self.fields, path)
    }

    /// Non-empty text content at `path`.
    #[must_use]
    pub fn text(&self, path: &[&str]) -> Option<&str> {
        self.get(path).and_then(text_of)
    }

    /// Records at `path`. A single record is yielded as a one-element list.
    pub fn items<'desc>(
        &'desc self,
        path: &[&str],
    ) -> impl Iterator<Item = &'desc Value> + use<'desc> {
        let records: &[Value] = match self.get(path) {
            Some(&Value::Array(ref values)) => values,
            Some(value) => core::slice::from_ref(value),
            None => &[],
        };
        records.iter()
    }
}

/// Walks `path` below `value`.
#[must_use]
pub fn lookup<'value>(value: &'value Value, path: &[&str]) -> Option<&'value Value> {
    path.iter().try_fold(value, |node, &key| node.get(key))
}

/// Text content of a leaf, or of the `#text` entry of an element that also
/// carries attributes. Whitespace-only text counts as absent.
#[must_use]
pub fn text_of(value: &Value) -> Option<&str> {
    let text = match *value {
        Value::String(ref s) => s.as_str(),
        Value::Object(ref map) => map.get("#text")?.as_str()?,
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then_some(text)
}

fn element_to_value(node: roxmltree::Node<'_, '_>) -> Value {
    let mut map = Map::new();

    for attr in node.attributes() {
        map.insert(
            format!("@{}", attr.name()),
            Value::String(attr.value().to_string()),
        );
    }

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            let tag = child.tag_name().name().to_string();
            let value = element_to_value(child);
            match map.get_mut(&tag) {
                Some(&mut Value::Array(ref mut values)) => values.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(tag, value);
                }
            }
        } else if let Some(t) = child.text().filter(|_| child.is_text()) {
            let t = t.trim();
            if !t.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(t);
            }
        }
    }

    match (map.is_empty(), text.is_empty()) {
        (true, true) => Value::Null,
        (true, false) => Value::String(text),
        (false, true) => Value::Object(map),
        (false, false) => {
            map.insert("#text".to_string(), Value::String(text));
            Value::Object(map)
        }
    }
}
