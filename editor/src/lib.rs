//! Tree compilation and interaction engine for the page builder editor.
//!
//! A page is described by a JSON layout tree. This crate turns that tree into
//! a compiled, renderable mirror (resolving every component through a
//! [`loader::ComponentLoader`]), serializes recompilation under rapid edits,
//! records undo/redo history, and converts pointer gestures over resize
//! handles into layout edits. The host (browser shell or test harness) owns
//! the DOM and feeds events in; everything here is plain data and async
//! functions so it can be exercised without a browser.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`layout`] | Layout tree model, parsing and validation |
//! | [`loader`] | Component registry seam and caching loader |
//! | [`compile`] | Recursive async tree compiler |
//! | [`scheduler`] | Single-flight, most-recent-wins compilation scheduler |
//! | [`history`] | Undo/redo snapshot recorder |
//! | [`gesture`] | Resize/move gesture state machine |
//! | [`engine`] | Editor store core wiring the pieces together |
//! | [`api`] | HTTP client for the page server endpoints |
//! | [`config`] | Environment-driven editor configuration |
//! | [`consts`] | Shared constants (handles, position vocabulary, defaults) |

pub mod api;
pub mod compile;
pub mod config;
pub mod consts;
pub mod engine;
pub mod gesture;
pub mod history;
pub mod layout;
pub mod loader;
pub mod scheduler;
