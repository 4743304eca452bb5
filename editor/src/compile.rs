//! Tree compiler: layout tree → compiled, renderable tree.
//!
//! DESIGN
//! ======
//! Compilation walks the layout tree depth-first. Every visible node resolves
//! its component through the [`ComponentLoader`], then compiles its children.
//! Siblings resolve concurrently and are reassembled by source index
//! (`try_join_all`), so a slow first sibling never lets a fast third sibling
//! jump ahead in the output.
//!
//! Hidden nodes are filtered out before any future is created for them: their
//! subtree is never visited and the loader never sees their components.
//!
//! Interaction bindings exist only in the edit environment. In any other
//! environment the field is `None`, not a set of inert handlers, so a preview
//! render is structurally the edit render minus bindings.
//!
//! ERROR HANDLING
//! ==============
//! The first resolution failure aborts the whole pass and drops every sibling
//! future still in flight. No partial tree is ever returned; the scheduler
//! keeps publishing the previous result.

#[cfg(test)]
#[path = "compile_test.rs"]
mod compile_test;

use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, try_join_all};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{EDIT_ENV, OVERLAY_POSITIONS, WRAPPER_CURSOR};
use crate::gesture::Handle;
use crate::layout::{LayoutNode, LayoutTree, Props, Style};
use crate::loader::{ComponentImpl, ComponentLoader, LoaderError};

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Where the compiled tree will be shown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    /// The editor canvas: bindings and resize overlays are attached.
    Edit,
    /// Any other host (preview, published page).
    Other(String),
}

impl Environment {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw == EDIT_ENV { Self::Edit } else { Self::Other(raw.to_owned()) }
    }

    #[must_use]
    pub fn is_edit(&self) -> bool {
        matches!(self, Self::Edit)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Edit => EDIT_ENV,
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Environment {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<Environment> for String {
    fn from(env: Environment) -> Self {
        env.as_str().to_owned()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// BINDINGS & OVERLAY
// =============================================================================

/// DOM events the editor listens to on every compiled wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditEvent {
    DragOver,
    DragLeave,
    Drop,
    Click,
    MouseOver,
    MouseLeave,
}

/// Editor callback an [`EditEvent`] is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditCallback {
    /// Drag-and-drop feedback, tagged `dragover` / `dragout` / `drop`.
    Drag(&'static str),
    /// Hover highlight, tagged `mouseover` / `mouseleave`.
    Hover(&'static str),
    /// Node selection.
    Select,
}

impl EditEvent {
    pub const ALL: [EditEvent; 6] =
        [Self::DragOver, Self::DragLeave, Self::Drop, Self::Click, Self::MouseOver, Self::MouseLeave];

    /// DOM event name as the browser reports it.
    #[must_use]
    pub fn dom_name(self) -> &'static str {
        match self {
            Self::DragOver => "dragover",
            Self::DragLeave => "dragleave",
            Self::Drop => "drop",
            Self::Click => "click",
            Self::MouseOver => "mouseover",
            Self::MouseLeave => "mouseleave",
        }
    }

    #[must_use]
    pub fn callback(self) -> EditCallback {
        match self {
            Self::DragOver => EditCallback::Drag("dragover"),
            Self::DragLeave => EditCallback::Drag("dragout"),
            Self::Drop => EditCallback::Drag("drop"),
            Self::Click => EditCallback::Select,
            Self::MouseOver => EditCallback::Hover("mouseover"),
            Self::MouseLeave => EditCallback::Hover("mouseleave"),
        }
    }
}

/// Interaction bindings attached to a wrapper in the edit environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditBindings {
    /// Node id every callback reports.
    pub target: String,
    pub events: Vec<EditEvent>,
}

impl EditBindings {
    fn for_node(id: &str) -> Self {
        Self { target: id.to_owned(), events: EditEvent::ALL.to_vec() }
    }

    /// Route a raw DOM event name to the editor callback bound for it.
    #[must_use]
    pub fn route(&self, dom_event: &str) -> Option<EditCallback> {
        self.events
            .iter()
            .find(|e| e.dom_name() == dom_event)
            .map(|e| e.callback())
    }
}

/// One grab area of the resize overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayHandle {
    /// Render key: node id followed by the handle code.
    pub key: String,
    pub handle: Handle,
}

/// Nine-handle resize/move mask drawn over the selected positioned node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeOverlay {
    pub handles: Vec<OverlayHandle>,
}

impl ResizeOverlay {
    fn for_node(id: &str) -> Self {
        let handles = Handle::ALL
            .iter()
            .map(|&handle| OverlayHandle { key: format!("{id}{}", handle.code()), handle })
            .collect();
        Self { handles }
    }
}

// =============================================================================
// COMPILED TREE
// =============================================================================

/// Renderable mirror of one visible layout node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledNode {
    /// Stable identity key (the layout node id).
    pub key: String,
    pub component: Arc<ComponentImpl>,
    /// Authored style with editor overrides applied.
    pub style: Style,
    pub props: Props,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindings: Option<EditBindings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<ResizeOverlay>,
    pub children: Vec<CompiledNode>,
}

/// Output of one compilation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledTree {
    /// Passed to every component as its `env` prop by the host.
    pub environment: Environment,
    pub nodes: Vec<CompiledNode>,
}

impl CompiledTree {
    /// Total number of compiled nodes at every depth.
    #[must_use]
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[CompiledNode]) -> usize {
            nodes.iter().map(|n| 1 + count(&n.children)).sum()
        }
        count(&self.nodes)
    }

    /// Find a compiled node by key anywhere in the tree.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&CompiledNode> {
        fn walk<'a>(nodes: &'a [CompiledNode], key: &str) -> Option<&'a CompiledNode> {
            nodes
                .iter()
                .find_map(|n| if n.key == key { Some(n) } else { walk(&n.children, key) })
        }
        walk(&self.nodes, key)
    }
}

/// Errors that abort a compilation pass.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("failed to resolve `{component}` for node `{node}`: {source}")]
    Resolve {
        node: String,
        component: String,
        #[source]
        source: LoaderError,
    },
}

// =============================================================================
// COMPILER
// =============================================================================

/// Per-pass inputs shared by every recursive call.
struct Pass<'a> {
    env: &'a Environment,
    selection: Option<&'a str>,
}

/// Recursive async compiler over a [`ComponentLoader`].
#[derive(Clone)]
pub struct TreeCompiler {
    loader: Arc<dyn ComponentLoader>,
}

impl TreeCompiler {
    pub fn new(loader: Arc<dyn ComponentLoader>) -> Self {
        Self { loader }
    }

    /// Compile `tree` for `env`. In the edit environment the node named by
    /// `selection` also gets a resize overlay when it is positioned.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Resolve`] for the first node whose component
    /// cannot be resolved; nothing of the pass is kept.
    pub async fn compile(
        &self,
        tree: &LayoutTree,
        env: &Environment,
        selection: Option<&str>,
    ) -> Result<CompiledTree, CompileError> {
        let pass = Pass { env, selection };
        let nodes = self.compile_children(&tree.nodes, &pass).await?;
        Ok(CompiledTree { environment: env.clone(), nodes })
    }

    fn compile_children<'a>(
        &'a self,
        nodes: &'a [LayoutNode],
        pass: &'a Pass<'a>,
    ) -> BoxFuture<'a, Result<Vec<CompiledNode>, CompileError>> {
        let visible: Vec<_> = nodes
            .iter()
            .filter(|n| !n.hidden)
            .map(|n| self.compile_node(n, pass))
            .collect();
        try_join_all(visible).boxed()
    }

    async fn compile_node(&self, node: &LayoutNode, pass: &Pass<'_>) -> Result<CompiledNode, CompileError> {
        let component = self
            .loader
            .resolve(&node.component, &node.variant)
            .await
            .map_err(|source| CompileError::Resolve {
                node: node.id.clone(),
                component: node.component.clone(),
                source,
            })?;

        let children = self.compile_children(node.children(), pass).await?;

        Ok(CompiledNode {
            key: node.id.clone(),
            component,
            style: merged_style(&node.style),
            props: node.props.clone(),
            bindings: pass.env.is_edit().then(|| EditBindings::for_node(&node.id)),
            overlay: overlay_for(node, pass),
            children,
        })
    }
}

/// Authored style plus editor overrides. Overrides win on conflict.
#[must_use]
pub fn merged_style(style: &Style) -> Style {
    let mut merged = style.clone();
    merged.insert("cursor".into(), serde_json::json!(WRAPPER_CURSOR));
    if let Some(image) = style.get("backgroundImage").and_then(|v| v.as_str()) {
        if !image.is_empty() && !image.starts_with("url(") {
            merged.insert("backgroundImage".into(), serde_json::json!(format!("url({image})")));
        }
    }
    merged
}

fn overlay_for(node: &LayoutNode, pass: &Pass<'_>) -> Option<ResizeOverlay> {
    if !pass.env.is_edit() || pass.selection != Some(node.id.as_str()) {
        return None;
    }
    match node.position() {
        Some(position) if OVERLAY_POSITIONS.contains(&position) => Some(ResizeOverlay::for_node(&node.id)),
        Some(position) => {
            debug!(node = %node.id, position, "selected node position takes no resize overlay");
            None
        }
        None => None,
    }
}
