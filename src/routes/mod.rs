//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The editor and the preview page talk to this server over three `POST`
//! endpoints. CORS is fully open because the editor is served from a
//! different origin during component development; responses are gzipped.

pub mod page;

use axum::Router;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/loadPage", post(page::load_page))
        .route("/getCompMenu", post(page::comp_menu))
        .route("/savePage", post(page::save_page))
        .route("/healthz", get(page::healthz))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
