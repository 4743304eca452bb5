//! Compilation scheduler — single-flight, most-recent-wins.
//!
//! DESIGN
//! ======
//! One scheduler instance owns the `busy` flag and a single `pending` slot.
//! The first `trigger` that finds the scheduler idle becomes the driver: it
//! marks busy (before its first await), compiles, publishes, then keeps
//! draining `pending` until the slot is empty and only then clears busy.
//! Triggers that arrive while busy overwrite `pending` and return at once, so
//! a burst of edits costs at most one queued pass no matter its length.
//!
//! Triggers are deduplicated against the last accepted `(tree, selection)`
//! input; re-rendering an unchanged store never starts a pass.
//!
//! The contract is eventual consistency: the last published tree always
//! reflects the newest trigger that compiled successfully, but intermediate
//! triggers may never be compiled.
//!
//! ERROR HANDLING
//! ==============
//! A failed pass publishes nothing. Subscribers keep the previous tree and
//! the failure is logged and counted. Draining continues with `pending`.
//!
//! The drain loop runs in its own task, so dropping a `trigger` future never
//! cancels a pass or strands a queued input. If the task itself unwinds, a
//! guard clears busy so the next trigger starts a fresh pass.

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::compile::{CompileError, CompiledTree, Environment, TreeCompiler};
use crate::layout::LayoutTree;

/// The `(tree, selection)` pair a pass compiles.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileInput {
    pub tree: Arc<LayoutTree>,
    pub selection: Option<String>,
}

impl CompileInput {
    #[must_use]
    pub fn new(tree: Arc<LayoutTree>, selection: Option<String>) -> Self {
        Self { tree, selection }
    }
}

/// What a `trigger` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Input equal to the last accepted one; nothing scheduled.
    Suppressed,
    /// A pass was in flight; input parked in the pending slot.
    Queued,
    /// This call drove `passes` passes to completion and left the scheduler idle.
    Drained { passes: usize },
    /// The drain task panicked or the runtime shut down under it.
    Interrupted,
}

/// A successfully compiled tree as handed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    /// Increments with every successful pass.
    pub generation: u64,
    pub input: CompileInput,
    pub tree: CompiledTree,
}

/// Counters for observability and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub passes: u64,
    pub failures: u64,
    pub busy: bool,
    pub pending: bool,
}

#[derive(Debug, Default)]
struct SchedulerState {
    busy: bool,
    pending: Option<CompileInput>,
    last_seen: Option<CompileInput>,
    passes: u64,
    failures: u64,
    generation: u64,
    last_error: Option<CompileError>,
}

pub struct CompilationScheduler {
    shared: Arc<Shared>,
}

/// Everything the drain task needs; outlives any single `trigger` call.
struct Shared {
    compiler: TreeCompiler,
    env: Environment,
    state: Mutex<SchedulerState>,
    published: watch::Sender<Option<Arc<Published>>>,
}

impl CompilationScheduler {
    #[must_use]
    pub fn new(compiler: TreeCompiler, env: Environment) -> Self {
        let (published, _) = watch::channel(None);
        let shared = Shared { compiler, env, state: Mutex::new(SchedulerState::default()), published };
        Self { shared: Arc::new(shared) }
    }

    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.shared.env
    }

    /// Receive every published tree. The current value is the latest one.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Published>>> {
        self.shared.published.subscribe()
    }

    /// The most recently published tree, if any pass has succeeded.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<Published>> {
        self.shared.published.borrow().clone()
    }

    /// Error of the most recent failed pass, cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<CompileError> {
        self.shared.lock().last_error.clone()
    }

    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let state = self.shared.lock();
        SchedulerStats {
            passes: state.passes,
            failures: state.failures,
            busy: state.busy,
            pending: state.pending.is_some(),
        }
    }

    /// Request a compilation of `input`.
    ///
    /// Returns immediately when suppressed or queued. Otherwise the drain
    /// loop is spawned onto the runtime and this call waits for it. Dropping
    /// the returned future detaches the loop; it still finishes the pass in
    /// flight and every queued input.
    pub async fn trigger(&self, input: CompileInput) -> TriggerOutcome {
        {
            let mut state = self.shared.lock();
            if state.last_seen.as_ref() == Some(&input) {
                trace!("compile trigger suppressed: input unchanged");
                return TriggerOutcome::Suppressed;
            }
            state.last_seen = Some(input.clone());
            if state.busy {
                if state.pending.replace(input).is_some() {
                    debug!("pending compile input superseded");
                }
                return TriggerOutcome::Queued;
            }
            state.busy = true;
            // Left behind by an interrupted drain; this input is newer.
            if state.pending.take().is_some() {
                debug!("stale pending compile input superseded");
            }
        }

        let shared = Arc::clone(&self.shared);
        match tokio::spawn(async move { shared.drain(input).await }).await {
            Ok(passes) => TriggerOutcome::Drained { passes },
            Err(e) => {
                warn!(error = %e, "compile drain task did not complete");
                TriggerOutcome::Interrupted
            }
        }
    }
}

impl Shared {
    /// Run passes until the pending slot is empty, then clear busy.
    async fn drain(&self, first: CompileInput) -> usize {
        let mut guard = BusyGuard { shared: self, armed: true };
        let mut current = first;
        let mut passes = 0;
        loop {
            passes += 1;
            self.run_pass(&current).await;

            let mut state = self.lock();
            match state.pending.take() {
                Some(next) => current = next,
                None => {
                    state.busy = false;
                    guard.armed = false;
                    break;
                }
            }
        }
        passes
    }

    async fn run_pass(&self, input: &CompileInput) {
        debug!(env = %self.env, selection = ?input.selection, "compilation pass started");
        let result = self
            .compiler
            .compile(&input.tree, &self.env, input.selection.as_deref())
            .await;

        let mut state = self.lock();
        state.passes += 1;
        match result {
            Ok(tree) => {
                state.generation += 1;
                state.last_error = None;
                let generation = state.generation;
                drop(state);
                debug!(generation, nodes = tree.node_count(), "compilation pass published");
                self.published
                    .send_replace(Some(Arc::new(Published { generation, input: input.clone(), tree })));
            }
            Err(e) => {
                state.failures += 1;
                warn!(error = %e, "compilation pass failed; keeping previous tree");
                state.last_error = Some(e);
                // Allow an identical retry once the loader recovers.
                if state.last_seen.as_ref() == Some(input) {
                    state.last_seen = None;
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the single-flight slot if the drain task unwinds mid-pass.
/// The pending input stays parked; the next trigger supersedes it.
struct BusyGuard<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.shared.lock();
        state.busy = false;
        state.last_seen = None;
        warn!(pending = state.pending.is_some(), "compile drain interrupted mid-pass; scheduler released");
    }
}
