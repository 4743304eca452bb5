//! Shared constants for the editor crate.

// ── Environment ─────────────────────────────────────────────────

/// Environment name that enables interaction bindings and resize overlays.
pub const EDIT_ENV: &str = "edit";

// ── Resize overlay ──────────────────────────────────────────────

/// `position` values that make the selected node eligible for a resize overlay.
///
/// Misspellings such as `"fiexd"` are not accepted. A selected node with any
/// other value gets no overlay and a `debug` event (see [`crate::compile`]).
pub const OVERLAY_POSITIONS: [&str; 3] = ["relative", "fixed", "absolute"];

// ── Styles ──────────────────────────────────────────────────────

/// Cursor forced onto every compiled wrapper so the editor surface never shows a text caret.
pub const WRAPPER_CURSOR: &str = "default";

// ── History ─────────────────────────────────────────────────────

/// Default maximum number of snapshots kept by the history recorder.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

// ── API ─────────────────────────────────────────────────────────

/// Default base URL of the page server.
pub const DEFAULT_API_BASE: &str = "http://localhost:3000";

/// Envelope `error` value the page server uses for success.
pub const API_OK: i64 = 0;
