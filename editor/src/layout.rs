//! Layout model: the JSON page tree the editor edits.
//!
//! The page server stores a page as an ordered array of nodes. Each node names
//! a component (`name`) and its data-binding variant (`hook`), carries a style
//! map and an opaque props map, and may nest children. Every edit in the
//! editor replaces the tree wholesale, so the types here are plain values with
//! cheap structural equality.
//!
//! Parsing is strict about identity: a node without `el` or `name` is a data
//! integrity error, reported as [`LayoutError`]. Hidden nodes are valid data;
//! they are skipped later by the compiler.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Style map applied to a node's wrapper (CSS property → value).
pub type Style = serde_json::Map<String, serde_json::Value>;

/// Props map passed through to the component untouched.
pub type Props = serde_json::Map<String, serde_json::Value>;

/// Errors produced while parsing or validating a layout tree.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The JSON did not match the node shape (missing `el`/`name`, wrong types).
    #[error("malformed layout tree: {0}")]
    Malformed(String),

    /// A required identity field is present but empty.
    #[error("empty `{field}` at {path}")]
    EmptyField { field: &'static str, path: String },

    /// Two nodes share the same `el`.
    #[error("duplicate node id `{id}` at {path}")]
    DuplicateId { id: String, path: String },
}

/// One node of the page layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    /// Unique element id within the tree.
    #[serde(rename = "el")]
    pub id: String,
    /// Component identifier resolved through the component loader.
    #[serde(rename = "name")]
    pub component: String,
    /// Variant key selecting the component's data-binding behavior.
    #[serde(rename = "hook", default)]
    pub variant: String,
    /// Hidden nodes and their subtrees are not compiled.
    #[serde(rename = "hide", default)]
    pub hidden: bool,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub props: Props,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<LayoutNode>>,
}

impl LayoutNode {
    /// Build a visible leaf node with empty style and props.
    pub fn new(id: impl Into<String>, component: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component: component.into(),
            variant: variant.into(),
            hidden: false,
            style: Style::new(),
            props: Props::new(),
            children: None,
        }
    }

    /// Children in source order (empty when absent).
    #[must_use]
    pub fn children(&self) -> &[LayoutNode] {
        self.children.as_deref().unwrap_or_default()
    }

    /// The CSS `position` value, if set as a string.
    #[must_use]
    pub fn position(&self) -> Option<&str> {
        self.style.get("position").and_then(|v| v.as_str())
    }
}

/// The whole page: an ordered list of root nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutTree {
    pub nodes: Vec<LayoutNode>,
}

impl LayoutTree {
    #[must_use]
    pub fn new(nodes: Vec<LayoutNode>) -> Self {
        Self { nodes }
    }

    /// Parse and validate a tree from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Malformed`] when the JSON does not match the node
    /// shape, or a validation error from [`LayoutTree::validate`].
    pub fn from_json(raw: &str) -> Result<Self, LayoutError> {
        let tree: Self = serde_json::from_str(raw).map_err(|e| LayoutError::Malformed(e.to_string()))?;
        tree.validate()?;
        Ok(tree)
    }

    /// Parse and validate a tree from an already-decoded JSON value.
    ///
    /// # Errors
    ///
    /// Same as [`LayoutTree::from_json`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, LayoutError> {
        let tree: Self = serde_json::from_value(value).map_err(|e| LayoutError::Malformed(e.to_string()))?;
        tree.validate()?;
        Ok(tree)
    }

    /// Check identity fields and id uniqueness across the whole tree.
    ///
    /// # Errors
    ///
    /// Returns the first violation found in depth-first order.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut seen = HashSet::new();
        validate_nodes(&self.nodes, "$", &mut seen)
    }

    /// Find a node by id anywhere in the tree.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&LayoutNode> {
        find_node(&self.nodes, id)
    }

    /// Find a node by id anywhere in the tree, mutably.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut LayoutNode> {
        find_node_mut(&mut self.nodes, id)
    }
}

fn validate_nodes<'a>(nodes: &'a [LayoutNode], path: &str, seen: &mut HashSet<&'a str>) -> Result<(), LayoutError> {
    for (i, node) in nodes.iter().enumerate() {
        let here = format!("{path}[{i}]");
        if node.id.is_empty() {
            return Err(LayoutError::EmptyField { field: "el", path: here });
        }
        if node.component.is_empty() {
            return Err(LayoutError::EmptyField { field: "name", path: here });
        }
        if !seen.insert(node.id.as_str()) {
            return Err(LayoutError::DuplicateId { id: node.id.clone(), path: here });
        }
        validate_nodes(node.children(), &format!("{here}.children"), seen)?;
    }
    Ok(())
}

fn find_node<'a>(nodes: &'a [LayoutNode], id: &str) -> Option<&'a LayoutNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node(node.children(), id) {
            return Some(found);
        }
    }
    None
}

fn find_node_mut<'a>(nodes: &'a mut [LayoutNode], id: &str) -> Option<&'a mut LayoutNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(children) = node.children.as_mut() {
            if let Some(found) = find_node_mut(children, id) {
                return Some(found);
            }
        }
    }
    None
}

// =============================================================================
// BOX MODEL
// =============================================================================

/// Offset half of a [`BoxModel`], nested to match the wire format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxPosition {
    pub left: f64,
    pub top: f64,
}

/// A node's rendered box: `{width, height, position: {left, top}}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxModel {
    pub width: f64,
    pub height: f64,
    pub position: BoxPosition,
}

impl BoxModel {
    #[must_use]
    pub fn new(width: f64, height: f64, left: f64, top: f64) -> Self {
        Self { width, height, position: BoxPosition { left, top } }
    }

    #[must_use]
    pub fn left(&self) -> f64 {
        self.position.left
    }

    #[must_use]
    pub fn top(&self) -> f64 {
        self.position.top
    }

    /// Read a box from a style map. Missing or unparsable values read as `0`.
    ///
    /// Hosts with a real layout engine should prefer the computed box; this is
    /// the fallback when only the authored style is available.
    #[must_use]
    pub fn from_style(style: &Style) -> Self {
        let read = |key: &str| style.get(key).and_then(css_px).unwrap_or(0.0);
        Self::new(read("width"), read("height"), read("left"), read("top"))
    }

    /// Write this box into a style map as numeric pixel values.
    pub fn write_to(&self, style: &mut Style) {
        style.insert("width".into(), serde_json::json!(self.width));
        style.insert("height".into(), serde_json::json!(self.height));
        style.insert("left".into(), serde_json::json!(self.position.left));
        style.insert("top".into(), serde_json::json!(self.position.top));
    }
}

/// Interpret a CSS length as pixels: bare numbers or `"NNpx"` strings.
#[must_use]
pub fn css_px(value: &serde_json::Value) -> Option<f64> {
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    let raw = value.as_str()?.trim();
    let digits = raw.strip_suffix("px").unwrap_or(raw).trim();
    match digits.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => None,
    }
}
