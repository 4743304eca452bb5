//! Resize/move gesture state machine for the nine-handle overlay.
//!
//! The machine has two states. `Idle` waits for a pointer-down on a handle.
//! `Active` carries everything needed to turn later pointer positions into a
//! box: the target node, the handle, the pointer origin and the box as it was
//! rendered at pointer-down. Every move recomputes the box from that origin
//! (never from the previous move), so dropped move events cannot accumulate
//! drift.
//!
//! The controller never edits the layout. Each computed box leaves as an
//! [`Action::EditCompBox`] for the store to apply.
//!
//! Pointer-up and pointer-leave both end a gesture, and both are accepted in
//! any state. A host that forwards every up/leave it sees (including the
//! window-level listeners it installs while a gesture is active) therefore
//! cannot strand the machine in `Active`.

#[cfg(test)]
#[path = "gesture_test.rs"]
mod gesture_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{Action, EditCompBox};
use crate::layout::BoxModel;

/// Screen-space pointer position (`clientX`, `clientY`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The nine overlay handles, named by column (L/M/R) then row (T/M/B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Handle {
    Lt,
    Mt,
    Rt,
    Lm,
    Mm,
    Rm,
    Lb,
    Mb,
    Rb,
}

/// Which edge of one axis a handle drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    Middle,
    End,
}

impl Handle {
    /// Overlay render order: row by row, left to right.
    pub const ALL: [Handle; 9] =
        [Self::Lt, Self::Mt, Self::Rt, Self::Lm, Self::Mm, Self::Rm, Self::Lb, Self::Mb, Self::Rb];

    /// Two-letter code used in overlay keys and on the wire.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Lt => "LT",
            Self::Mt => "MT",
            Self::Rt => "RT",
            Self::Lm => "LM",
            Self::Mm => "MM",
            Self::Rm => "RM",
            Self::Lb => "LB",
            Self::Mb => "MB",
            Self::Rb => "RB",
        }
    }

    /// The center handle moves the box instead of resizing it.
    #[must_use]
    pub fn is_move(self) -> bool {
        self == Self::Mm
    }

    fn horizontal(self) -> Edge {
        match self {
            Self::Lt | Self::Lm | Self::Lb => Edge::Start,
            Self::Mt | Self::Mm | Self::Mb => Edge::Middle,
            Self::Rt | Self::Rm | Self::Rb => Edge::End,
        }
    }

    fn vertical(self) -> Edge {
        match self {
            Self::Lt | Self::Mt | Self::Rt => Edge::Start,
            Self::Lm | Self::Mm | Self::Rm => Edge::Middle,
            Self::Lb | Self::Mb | Self::Rb => Edge::End,
        }
    }
}

/// Apply a pointer delta to `origin` for `handle`.
///
/// Start edges (left/top) keep the opposite edge fixed, so the offset follows
/// the clamped size. Sizes never go below zero.
#[must_use]
pub fn resize(origin: BoxModel, handle: Handle, dx: f64, dy: f64) -> BoxModel {
    if handle.is_move() {
        return BoxModel::new(origin.width, origin.height, origin.left() + dx, origin.top() + dy);
    }
    let (width, left) = resize_axis(origin.width, origin.left(), dx, handle.horizontal());
    let (height, top) = resize_axis(origin.height, origin.top(), dy, handle.vertical());
    BoxModel::new(width, height, left, top)
}

fn resize_axis(size: f64, offset: f64, delta: f64, edge: Edge) -> (f64, f64) {
    match edge {
        Edge::Middle => (size, offset),
        Edge::End => ((size + delta).max(0.0), offset),
        Edge::Start => {
            let new_size = (size - delta).max(0.0);
            (new_size, offset + size - new_size)
        }
    }
}

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Context captured at pointer-down and held for the gesture's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureState {
    pub target: String,
    pub handle: Handle,
    pub origin: Point,
    pub origin_box: BoxModel,
}

/// Gesture machine state. `Active` is the only place a [`GestureState`] lives.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GesturePhase {
    #[default]
    Idle,
    Active(GestureState),
}

/// Pointer input as the host delivers it.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    /// Pointer pressed on `handle` of node `target`, whose box is `rendered`.
    Down { target: String, handle: Handle, pointer: Point, rendered: BoxModel },
    Move(Point),
    Up,
    /// Pointer left the tracked surface.
    Leave,
}

/// Pure transition function: next phase plus the action to dispatch, if any.
///
/// Pointer-down only captures the origin. Boxes are emitted by moves, so a
/// click on a handle without movement never edits the layout.
#[must_use]
pub fn transition(phase: GesturePhase, event: PointerEvent) -> (GesturePhase, Option<Action>) {
    match (phase, event) {
        (_, PointerEvent::Down { target, handle, pointer, rendered }) => {
            let state = GestureState { target, handle, origin: pointer, origin_box: rendered };
            (GesturePhase::Active(state), None)
        }
        (GesturePhase::Active(state), PointerEvent::Move(pointer)) => {
            let next = resize(state.origin_box, state.handle, pointer.x - state.origin.x, pointer.y - state.origin.y);
            let action = box_action(&state, pointer, next);
            (GesturePhase::Active(state), Some(action))
        }
        (GesturePhase::Idle, PointerEvent::Move(_)) => (GesturePhase::Idle, None),
        (_, PointerEvent::Up | PointerEvent::Leave) => (GesturePhase::Idle, None),
    }
}

fn box_action(state: &GestureState, pointer: Point, current: BoxModel) -> Action {
    Action::EditCompBox(EditCompBox {
        el: state.target.clone(),
        handle: state.handle,
        client_x: pointer.x,
        client_y: pointer.y,
        current,
    })
}

/// Stateful wrapper the editor core owns.
#[derive(Debug, Default)]
pub struct GestureController {
    phase: GesturePhase,
}

impl GestureController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one pointer event; returns the action to dispatch, if any.
    pub fn handle(&mut self, event: PointerEvent) -> Option<Action> {
        let was_active = self.is_active();
        if was_active && matches!(event, PointerEvent::Down { .. }) {
            debug!("pointer-down while a gesture is active; restarting");
        }
        let (next, action) = transition(std::mem::take(&mut self.phase), event);
        match (&next, was_active) {
            (GesturePhase::Active(s), false) => debug!(node = %s.target, handle = s.handle.code(), "gesture started"),
            (GesturePhase::Idle, true) => debug!("gesture ended"),
            _ => {}
        }
        self.phase = next;
        action
    }

    /// Abandon any active gesture without emitting an action.
    pub fn reset(&mut self) {
        if self.is_active() {
            debug!("gesture abandoned");
        }
        self.phase = GesturePhase::Idle;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.phase, GesturePhase::Active(_))
    }

    /// The active gesture's context, if any.
    #[must_use]
    pub fn state(&self) -> Option<&GestureState> {
        match &self.phase {
            GesturePhase::Active(state) => Some(state),
            GesturePhase::Idle => None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> &GesturePhase {
        &self.phase
    }
}
