//! Scene description reader.
//!
//! Scene files describe the pieces on the table for one game (piece layout
//! files) or one camera snapshot (tracked-object files). Their schemas differ
//! between sub-corpora and are not validated here: the file is decoded into
//! an owned element tree and the record assembler reads attributes by name.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use crate::error::PentorefError;

/// An XML element with its attributes, text and element children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    /// Text directly inside the element, if any.
    pub text: Option<String>,
    pub children: Vec<SceneElement>,
}

impl SceneElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The `index`-th element child.
    pub fn child(&self, index: usize) -> Option<&SceneElement> {
        self.children.get(index)
    }

    /// First element child with the given name.
    pub fn find(&self, name: &str) -> Option<&SceneElement> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Elements matching a simple path, in document order.
    ///
    /// Supported forms: `name` (element children), `a/b` (children of
    /// children) and `.//name` (all descendants).
    pub fn find_all(&self, path: &str) -> Vec<&SceneElement> {
        if let Some(name) = path.strip_prefix(".//") {
            let mut out = Vec::new();
            self.collect_descendants(name, &mut out);
            return out;
        }

        let mut current: Vec<&SceneElement> = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            current = current
                .into_iter()
                .flat_map(|el| el.children.iter().filter(move |c| c.name == step))
                .collect();
        }
        current
    }

    fn collect_descendants<'a>(&'a self, name: &str, out: &mut Vec<&'a SceneElement>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            child.collect_descendants(name, out);
        }
    }
}

/// A decoded scene file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneDocument {
    pub root: SceneElement,
}

impl SceneDocument {
    /// Paths are evaluated relative to the root element.
    pub fn find_all(&self, path: &str) -> Vec<&SceneElement> {
        self.root.find_all(path)
    }
}

/// Reads a scene XML file.
pub fn read_scene_xml(path: &Path) -> Result<SceneDocument, PentorefError> {
    let xml = fs::read_to_string(path).map_err(PentorefError::Io)?;
    parse_scene_xml_str(&xml, path)
}

/// Parses scene XML from a string.
pub fn from_scene_xml_str(xml: &str) -> Result<SceneDocument, PentorefError> {
    parse_scene_xml_str(xml, Path::new("<string>"))
}

/// Parses scene XML from bytes (must be valid UTF-8).
pub fn from_scene_xml_slice(bytes: &[u8]) -> Result<SceneDocument, PentorefError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| PentorefError::SceneXmlParse {
        path: PathBuf::from("<bytes>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    parse_scene_xml_str(xml, Path::new("<bytes>"))
}

fn parse_scene_xml_str(xml: &str, path: &Path) -> Result<SceneDocument, PentorefError> {
    let document = Document::parse(xml).map_err(|source| PentorefError::SceneXmlParse {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;

    Ok(SceneDocument {
        root: to_owned_element(document.root_element()),
    })
}

fn to_owned_element(node: Node<'_, '_>) -> SceneElement {
    let text = node
        .children()
        .filter(Node::is_text)
        .filter_map(|t| t.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>();

    SceneElement {
        name: node.tag_name().name().to_string(),
        attributes: node
            .attributes()
            .map(|attr| (attr.name().to_string(), attr.value().to_string()))
            .collect(),
        text: if text.is_empty() {
            None
        } else {
            Some(text.join(" "))
        },
        children: node
            .children()
            .filter(Node::is_element)
            .map(to_owned_element)
            .collect(),
    }
}
