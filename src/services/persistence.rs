//! Persistence service — interval flush of the dirty page to disk.
//!
//! DESIGN
//! ======
//! A background task wakes on a fixed interval, snapshots the page tree
//! under a read lock if it changed, releases the lock, then writes the
//! snapshot. `/savePage` stays a pure in-memory update.
//!
//! ERROR HANDLING
//! ==============
//! The flushed revision only advances after a successful write, so a failed
//! write is retried on the next tick. A save landing mid-write bumps the
//! revision past the snapshot and is flushed on the following tick.

#[cfg(test)]
#[path = "persistence_test.rs"]
mod persistence_test;

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use crate::error::ErrorCode;
use crate::services::page_store;
use crate::state::AppState;

/// Spawn the background persistence task. Returns a handle for shutdown.
pub fn spawn_persistence_task(state: AppState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            flush_dirty_page(&state).await;
        }
    })
}

/// Write the page if it changed since the last successful flush.
/// Returns whether a write succeeded.
pub(crate) async fn flush_dirty_page(state: &AppState) -> bool {
    let (tree, revision) = {
        let page = state.page.read().await;
        if !page.is_dirty() {
            return false;
        }
        (page.tree.clone(), page.revision)
    };

    if let Err(e) = page_store::save_page(&state.page_path, &tree).await {
        error!(error = %e, code = e.error_code(), path = %state.page_path.display(), "page flush failed");
        return false;
    }

    let mut page = state.page.write().await;
    page.flushed_revision = page.flushed_revision.max(revision);
    debug!(revision, roots = tree.nodes.len(), "page flushed");
    true
}
