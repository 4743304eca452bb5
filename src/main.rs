mod config;
mod error;
mod routes;
mod services;
mod state;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::error::ErrorCode;
use crate::services::{page_store, persistence};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let loaded = async {
        Ok::<_, page_store::PageStoreError>((
            page_store::load_page(&config.page_path).await?,
            page_store::load_menu(&config.menu_path).await?,
            page_store::load_hook(&config.hook_path).await?,
        ))
    };
    let (tree, menu, hook) = match loaded.await {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, code = e.error_code(), "failed to load page store");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(roots = tree.nodes.len(), components = menu.len(), hooks = hook.len(), "page store loaded");

    let state = state::AppState::new(tree, menu, hook, config.page_path.clone());

    // Spawn background persistence task.
    let persistence = persistence::spawn_persistence_task(state.clone(), config.flush_interval);

    let app = routes::app(state.clone());
    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, port = config.port, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(port = config.port, "pagebuilder listening");
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "ctrl-c handler unavailable");
                std::future::pending::<()>().await;
            }
        })
        .await;

    persistence.abort();
    persistence::flush_dirty_page(&state).await;

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}
