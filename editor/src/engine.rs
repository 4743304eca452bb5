use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gesture::{GestureController, Handle, PointerEvent};
use crate::history::{Direction, HistoryRecorder, RecordOutcome, Snapshot};
use crate::layout::{BoxModel, LayoutError, LayoutTree};
use crate::scheduler::CompileInput;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Payload of `EDIT_COMP_BOX`: the box a gesture computed for node `el`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCompBox {
    pub el: String,
    pub handle: Handle,
    pub client_x: f64,
    pub client_y: f64,
    pub current: BoxModel,
}

/// Store actions, serialized as `{type, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    EditCompBox(EditCompBox),
    /// Select a node by id, or clear the selection.
    Select(Option<String>),
    /// Replace the whole tree (drag-drop insert, property panel edit, ...).
    ReplaceTree(LayoutTree),
    Undo,
    Redo,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EditError {
    #[error("no node with id `{0}`")]
    UnknownNode(String),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Editor store core — owns the tree, selection, history and gesture machine.
///
/// Separated from the host shell so it can be tested without a DOM. Every
/// mutating call returns the new [`CompileInput`] when `(tree, selection)`
/// changed; the host passes it to the scheduler.
#[derive(Debug)]
pub struct EditorCore {
    tree: Arc<LayoutTree>,
    selection: Option<String>,
    history: HistoryRecorder,
    gesture: GestureController,
    input_focused: bool,
}

impl EditorCore {
    /// Start editing `tree`; it becomes the first history point.
    #[must_use]
    pub fn new(tree: LayoutTree, history_depth: usize) -> Self {
        let tree = Arc::new(tree);
        let mut history = HistoryRecorder::new(history_depth);
        history.record(&Snapshot::edit(Arc::clone(&tree)), false);
        Self { tree, selection: None, history, gesture: GestureController::new(), input_focused: false }
    }

    // --- Queries ---

    #[must_use]
    pub fn tree(&self) -> &Arc<LayoutTree> {
        &self.tree
    }

    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    #[must_use]
    pub fn history(&self) -> &HistoryRecorder {
        &self.history
    }

    #[must_use]
    pub fn gesture(&self) -> &GestureController {
        &self.gesture
    }

    #[must_use]
    pub fn compile_input(&self) -> CompileInput {
        CompileInput::new(Arc::clone(&self.tree), self.selection.clone())
    }

    // --- Actions ---

    /// Apply one store action.
    ///
    /// # Errors
    ///
    /// [`EditError::UnknownNode`] when the action names a node that is not in
    /// the tree, [`EditError::Layout`] when a replacement tree is invalid.
    /// A failed action leaves the store untouched.
    pub fn apply(&mut self, action: Action) -> Result<Option<CompileInput>, EditError> {
        let before = self.compile_input();
        match action {
            Action::EditCompBox(payload) => {
                let mut next = LayoutTree::clone(&self.tree);
                let node = next
                    .find_mut(&payload.el)
                    .ok_or_else(|| EditError::UnknownNode(payload.el.clone()))?;
                payload.current.write_to(&mut node.style);
                self.commit(Snapshot::edit(Arc::new(next)));
            }
            Action::Select(target) => {
                if let Some(id) = target.as_deref() {
                    if self.tree.find(id).is_none() {
                        return Err(EditError::UnknownNode(id.to_owned()));
                    }
                }
                self.selection = target;
            }
            Action::ReplaceTree(tree) => {
                tree.validate()?;
                self.commit(Snapshot::edit(Arc::new(tree)));
            }
            Action::Undo => self.navigate(Direction::Back),
            Action::Redo => self.navigate(Direction::Forward),
        }
        Ok(self.changed_since(&before))
    }

    /// Feed a pointer event through the gesture machine and apply its action.
    ///
    /// History is not recorded per move; the finished gesture is recorded
    /// once when the machine returns to idle.
    ///
    /// # Errors
    ///
    /// [`EditError::UnknownNode`] when a pointer-down targets a node missing
    /// from the tree (the gesture machine is left idle), or when a move's
    /// [`EditCompBox`] cannot be applied.
    pub fn pointer(&mut self, event: PointerEvent) -> Result<Option<CompileInput>, EditError> {
        if let PointerEvent::Down { target, .. } = &event {
            if self.tree.find(target).is_none() {
                let was_active = self.gesture.is_active();
                self.gesture.reset();
                if was_active {
                    self.record_current("gesture abandoned");
                }
                return Err(EditError::UnknownNode(target.clone()));
            }
        }
        let was_active = self.gesture.is_active();
        let action = self.gesture.handle(event);
        let change = match action {
            Some(action) => self.apply(action)?,
            None => None,
        };
        if was_active && !self.gesture.is_active() {
            self.record_current("gesture end");
        }
        Ok(change)
    }

    /// Mark whether an editable field holds focus. Releasing focus records
    /// the tree as it stands, closing the batch of keystroke edits.
    pub fn set_input_focus(&mut self, focused: bool) {
        let released = self.input_focused && !focused;
        self.input_focused = focused;
        if released {
            self.record_current("input blur");
        }
    }

    fn navigate(&mut self, direction: Direction) {
        match self.history.navigate(direction) {
            Some(snapshot) => self.commit(snapshot),
            None => debug!(?direction, "history boundary; nothing to navigate"),
        }
    }

    fn commit(&mut self, snapshot: Snapshot) {
        let suppress = self.input_focused || self.gesture.is_active();
        self.history.record(&snapshot, suppress);
        self.tree = snapshot.tree;
    }

    fn record_current(&mut self, reason: &str) {
        let outcome = self.history.record(&Snapshot::edit(Arc::clone(&self.tree)), false);
        if outcome == RecordOutcome::Recorded {
            debug!(reason, "batched edit recorded");
        }
    }

    fn changed_since(&self, before: &CompileInput) -> Option<CompileInput> {
        let now = self.compile_input();
        (now != *before).then_some(now)
    }
}
