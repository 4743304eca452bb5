//! Page store — JSON files backing the page, the component menu and the
//! component module overrides.
//!
//! DESIGN
//! ======
//! The server keeps everything in memory and only touches disk at startup
//! and from the persistence task. A missing file is a fresh install, not an
//! error: it loads as an empty page / menu / override table. A file that
//! exists but does not parse is an error, so a corrupt page is never silently
//! replaced by an empty one on the next flush.
//!
//! Writes go to a sibling `.tmp` file first and are renamed into place.

#[cfg(test)]
#[path = "page_store_test.rs"]
mod page_store_test;

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use editor::layout::{LayoutError, LayoutTree};
use editor::loader::ComponentManifest;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum PageStoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl ErrorCode for PageStoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "E_STORE_IO",
            Self::Json { .. } => "E_STORE_JSON",
            Self::Layout(_) => "E_LAYOUT_INVALID",
        }
    }

    fn envelope_code(&self) -> i64 {
        match self {
            Self::Layout(_) => 400,
            Self::Io { .. } | Self::Json { .. } => 500,
        }
    }
}

/// Read and parse `path`, or `None` when it does not exist.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PageStoreError> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "store file missing; starting empty");
            return Ok(None);
        }
        Err(source) => return Err(PageStoreError::Io { path: path.to_owned(), source }),
    };
    serde_json::from_slice(&raw)
        .map(Some)
        .map_err(|source| PageStoreError::Json { path: path.to_owned(), source })
}

/// Load the stored page tree, validating it.
///
/// # Errors
///
/// I/O failures other than a missing file, unparsable JSON, or an invalid tree.
pub async fn load_page(path: &Path) -> Result<LayoutTree, PageStoreError> {
    match read_json::<serde_json::Value>(path).await? {
        Some(value) => Ok(LayoutTree::from_value(value)?),
        None => Ok(LayoutTree::default()),
    }
}

/// Load the component menu.
///
/// # Errors
///
/// I/O failures other than a missing file, or unparsable JSON.
pub async fn load_menu(path: &Path) -> Result<Vec<ComponentManifest>, PageStoreError> {
    Ok(read_json(path).await?.unwrap_or_default())
}

/// Load the component name → module URL override table.
///
/// # Errors
///
/// I/O failures other than a missing file, or unparsable JSON.
pub async fn load_hook(path: &Path) -> Result<BTreeMap<String, String>, PageStoreError> {
    Ok(read_json(path).await?.unwrap_or_default())
}

/// Write the page tree to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Serialization or I/O failures.
pub async fn save_page(path: &Path, tree: &LayoutTree) -> Result<(), PageStoreError> {
    let io_err = |source: std::io::Error| PageStoreError::Io { path: path.to_owned(), source };

    let body = serde_json::to_vec_pretty(tree).map_err(|source| PageStoreError::Json { path: path.to_owned(), source })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    tokio::fs::write(&tmp, body).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}
