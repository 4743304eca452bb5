//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! The page tree lives in memory behind a lock together with a dirty flag;
//! the persistence task flushes it to disk. The component menu and the
//! module override table are read once at startup and never change.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use editor::layout::LayoutTree;
use editor::loader::ComponentManifest;
use tokio::sync::RwLock;

// =============================================================================
// PAGE STATE
// =============================================================================

/// The live page plus whether it changed since the last flush.
#[derive(Debug, Default)]
pub struct PageState {
    pub tree: LayoutTree,
    /// Bumped on every save; the flusher compares it to detect saves that
    /// land while a write is in flight.
    pub revision: u64,
    pub flushed_revision: u64,
}

impl PageState {
    #[must_use]
    pub fn new(tree: LayoutTree) -> Self {
        Self { tree, revision: 0, flushed_revision: 0 }
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.revision != self.flushed_revision
    }

    /// Replace the tree and mark it dirty.
    pub fn replace(&mut self, tree: LayoutTree) {
        self.tree = tree;
        self.revision += 1;
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; every field is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub page: Arc<RwLock<PageState>>,
    pub menu: Arc<Vec<ComponentManifest>>,
    pub hook: Arc<BTreeMap<String, String>>,
    pub page_path: Arc<PathBuf>,
}

impl AppState {
    #[must_use]
    pub fn new(
        tree: LayoutTree,
        menu: Vec<ComponentManifest>,
        hook: BTreeMap<String, String>,
        page_path: PathBuf,
    ) -> Self {
        Self {
            page: Arc::new(RwLock::new(PageState::new(tree))),
            menu: Arc::new(menu),
            hook: Arc::new(hook),
            page_path: Arc::new(page_path),
        }
    }
}
