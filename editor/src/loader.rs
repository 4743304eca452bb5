//! Component resolution: the seam between the compiler and component code.
//!
//! DESIGN
//! ======
//! The compiler never knows how a component is obtained. It asks a
//! [`ComponentLoader`] for `(name, variant)` and gets back a shared
//! [`ComponentImpl`] descriptor, or a distinct error for unknown identifiers.
//! Loaders must tolerate repeated calls for the same pair; the compiler
//! re-resolves every visible node on every pass.
//!
//! [`RegistryLoader`] is the static table built from the component menu the
//! page server hands out. [`CachingLoader`] wraps any loader and memoizes
//! successful resolutions so slow backends are hit once per pair.

#[cfg(test)]
#[path = "loader_test.rs"]
mod loader_test;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::trace;

/// Errors produced by component resolution.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LoaderError {
    /// No component is registered under this name.
    #[error("unknown component: {0}")]
    UnknownComponent(String),

    /// The component exists but has no such variant.
    #[error("unknown variant `{variant}` for component `{name}`")]
    UnknownVariant { name: String, variant: String },

    /// The backing source failed (network, module evaluation, ...).
    #[error("component `{name}` unavailable: {reason}")]
    Unavailable { name: String, reason: String },
}

/// A resolved component: which module implements `name` for `variant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentImpl {
    pub name: String,
    pub variant: String,
    /// Module URL the host loads to instantiate the component.
    pub module: String,
}

/// Registry entry for one component, as listed in the component menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentManifest {
    pub name: String,
    /// Module used when the node's variant key is empty.
    pub module: String,
    /// Variant key → module URL.
    #[serde(default)]
    pub variants: BTreeMap<String, String>,
}

impl ComponentManifest {
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self { name: name.into(), module: module.into(), variants: BTreeMap::new() }
    }

    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<String>, module: impl Into<String>) -> Self {
        self.variants.insert(variant.into(), module.into());
        self
    }
}

/// Resolves a component identifier and variant key to an implementation.
#[async_trait]
pub trait ComponentLoader: Send + Sync {
    /// Resolve `(name, variant)`. Must be safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// [`LoaderError::UnknownComponent`] / [`LoaderError::UnknownVariant`] for
    /// identifiers the loader does not know, [`LoaderError::Unavailable`] when
    /// the backing source fails.
    async fn resolve(&self, name: &str, variant: &str) -> Result<Arc<ComponentImpl>, LoaderError>;
}

// =============================================================================
// STATIC REGISTRY
// =============================================================================

/// Loader backed by an in-memory manifest table.
#[derive(Debug, Clone, Default)]
pub struct RegistryLoader {
    components: HashMap<String, ComponentManifest>,
}

impl RegistryLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_manifests(manifests: impl IntoIterator<Item = ComponentManifest>) -> Self {
        let mut loader = Self::new();
        for manifest in manifests {
            loader.register(manifest);
        }
        loader
    }

    /// Build from the component menu, pointing each component named in
    /// `module_overrides` at the given module instead of the menu's default.
    /// This is how the page server redirects components under local debugging.
    #[must_use]
    pub fn from_menu(menu: Vec<ComponentManifest>, module_overrides: &BTreeMap<String, String>) -> Self {
        Self::from_manifests(menu.into_iter().map(|mut manifest| {
            if let Some(module) = module_overrides.get(&manifest.name) {
                manifest.module.clone_from(module);
            }
            manifest
        }))
    }

    /// Add or replace a component entry.
    pub fn register(&mut self, manifest: ComponentManifest) {
        self.components.insert(manifest.name.clone(), manifest);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn lookup(&self, name: &str, variant: &str) -> Result<ComponentImpl, LoaderError> {
        let manifest = self
            .components
            .get(name)
            .ok_or_else(|| LoaderError::UnknownComponent(name.to_owned()))?;
        let module = if variant.is_empty() {
            manifest.module.clone()
        } else {
            manifest
                .variants
                .get(variant)
                .cloned()
                .ok_or_else(|| LoaderError::UnknownVariant { name: name.to_owned(), variant: variant.to_owned() })?
        };
        Ok(ComponentImpl { name: name.to_owned(), variant: variant.to_owned(), module })
    }
}

#[async_trait]
impl ComponentLoader for RegistryLoader {
    async fn resolve(&self, name: &str, variant: &str) -> Result<Arc<ComponentImpl>, LoaderError> {
        self.lookup(name, variant).map(Arc::new)
    }
}

// =============================================================================
// CACHE
// =============================================================================

/// Memoizing wrapper. Failures are not cached so a transient outage heals.
///
/// The lock is released while the inner loader runs, so sibling resolutions
/// proceed concurrently; two racing misses for the same pair both hit the
/// inner loader and the later insert wins.
pub struct CachingLoader<L> {
    inner: L,
    cache: Mutex<HashMap<(String, String), Arc<ComponentImpl>>>,
}

impl<L: ComponentLoader> CachingLoader<L> {
    pub fn new(inner: L) -> Self {
        Self { inner, cache: Mutex::new(HashMap::new()) }
    }

    /// Number of cached `(name, variant)` pairs.
    pub async fn cached(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Drop every cached entry (e.g. after the component menu changes).
    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }
}

#[async_trait]
impl<L: ComponentLoader> ComponentLoader for CachingLoader<L> {
    async fn resolve(&self, name: &str, variant: &str) -> Result<Arc<ComponentImpl>, LoaderError> {
        let key = (name.to_owned(), variant.to_owned());
        if let Some(hit) = self.cache.lock().await.get(&key) {
            trace!(name, variant, "component cache hit");
            return Ok(Arc::clone(hit));
        }
        let resolved = self.inner.resolve(name, variant).await?;
        self.cache.lock().await.insert(key, Arc::clone(&resolved));
        Ok(resolved)
    }
}
