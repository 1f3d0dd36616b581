use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::admin_http::spawn_admin_server;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::observability;
use crate::routes::{self, AppState};
use service::{attributes::AttributeService, authz::RemoteAuthorizer, runtime, storage};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Wire the remote authorizer and the process-wide store into the gateway service.
pub fn build_state(cfg: &AppConfig) -> Result<AppState, StartupError> {
    let authorizer =
        RemoteAuthorizer::from_config(&cfg.authorizer).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let store = storage::shared_store(&cfg.storage);
    let svc = AttributeService::new(Arc::new(authorizer), store);
    Ok(AppState::new(Arc::new(svc)))
}

/// Build the application router for `cfg`.
pub fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let state = build_state(cfg)?;
    Ok(routes::build_router(state, build_cors()))
}

/// Serve with an already loaded configuration
pub async fn run_with_config(cfg: AppConfig) -> anyhow::Result<()> {
    runtime::ensure_storage(&cfg.storage)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    if let Some(admin_addr) = &cfg.server.admin_addr {
        spawn_admin_server(admin_addr, observability::metrics_text).await?;
    }

    let app = build_app(&cfg)?;

    let addr: SocketAddr = cfg.server.bind_addr().parse()?;
    info!(
        %addr,
        authorizer = %cfg.authorizer.base_url,
        backend = ?cfg.storage.backend,
        table = %cfg.storage.table_name,
        "starting custom attributes server"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
