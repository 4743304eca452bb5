//! Page and component menu endpoints.
//!
//! Every response is an `{error, msg, data}` envelope; `error == 0` is
//! success. Clients written against the editor's `PageApi` decode these
//! directly.

#[cfg(test)]
#[path = "page_test.rs"]
mod page_test;

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use editor::api::Envelope;
use editor::layout::LayoutTree;
use editor::loader::ComponentManifest;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ErrorCode;
use crate::services::page_store::PageStoreError;
use crate::state::AppState;

/// `data` of a `/loadPage` response.
#[derive(Debug, Serialize)]
pub struct LoadPageData {
    pub tree: LayoutTree,
    pub hook: BTreeMap<String, String>,
}

/// `POST /loadPage` — current page tree plus component module overrides.
pub async fn load_page(State(state): State<AppState>) -> Json<Envelope<LoadPageData>> {
    let tree = state.page.read().await.tree.clone();
    Json(Envelope::ok(Some(LoadPageData { tree, hook: (*state.hook).clone() })))
}

/// `POST /getCompMenu` — components the editor may drag into the page.
pub async fn comp_menu(State(state): State<AppState>) -> Json<Envelope<Vec<ComponentManifest>>> {
    Json(Envelope::ok(Some((*state.menu).clone())))
}

/// `POST /savePage` — replace the page with the posted tree.
///
/// The body is the bare tree array. It is validated before it touches state;
/// an invalid tree leaves the stored page unchanged.
pub async fn save_page(State(state): State<AppState>, Json(body): Json<serde_json::Value>) -> Response {
    let tree = match LayoutTree::from_value(body) {
        Ok(tree) => tree,
        Err(e) => return reject(&PageStoreError::from(e)),
    };
    let roots = tree.nodes.len();
    state.page.write().await.replace(tree);
    info!(roots, "page saved");
    Json(Envelope::<()>::ok(None)).into_response()
}

/// `GET /healthz`.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Map a failure to an HTTP status plus a rejection envelope.
pub(crate) fn reject<E: ErrorCode>(err: &E) -> Response {
    let code = err.envelope_code();
    let status = if code == 400 { StatusCode::BAD_REQUEST } else { StatusCode::INTERNAL_SERVER_ERROR };
    warn!(error = %err, code = err.error_code(), "request rejected");
    (status, Json(Envelope::<()>::rejected(code, err.to_string()))).into_response()
}
