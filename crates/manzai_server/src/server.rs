//! Wiring production collaborators and running the listener.

use crate::{ApiState, ManzaiConfig, RequestOrchestrator, StoreKind, create_router};
use axum::Router;
use manzai_error::{ManzaiResult, ServerError, ServerErrorKind};
use manzai_interface::UsageStore;
use manzai_ledger::{FileSystemUsageStore, InMemoryUsageStore};
use manzai_models::OpenAiCompatibleClient;
use manzai_prompt::ThreadRandom;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Open the configured usage store.
///
/// # Errors
///
/// Returns an error if the filesystem store directory cannot be created.
pub fn build_store(config: &ManzaiConfig) -> ManzaiResult<Arc<dyn UsageStore>> {
    let store: Arc<dyn UsageStore> = match config.metering.store {
        StoreKind::Memory => {
            warn!("Usage records are kept in memory and lost on restart");
            Arc::new(InMemoryUsageStore::new())
        }
        StoreKind::Filesystem => {
            Arc::new(FileSystemUsageStore::new(&config.metering.store_path)?)
        }
    };
    Ok(store)
}

/// Build the router with production collaborators.
///
/// # Errors
///
/// Returns an error if the client, store or technique catalog cannot be
/// created.
#[instrument(skip_all)]
pub fn build_app(config: &ManzaiConfig) -> ManzaiResult<Router> {
    let client_config = config.model.client_config();
    if client_config.requires_api_key() && client_config.api_key.is_none() {
        warn!(
            provider = %client_config.provider,
            "No API key configured; generation requests will fail"
        );
    }
    let client = OpenAiCompatibleClient::new(client_config)?;
    let store = build_store(config)?;
    let catalog = config.techniques.catalog()?;

    let orchestrator = RequestOrchestrator::new(
        config,
        Arc::new(client),
        store,
        Arc::new(catalog),
        Arc::new(ThreadRandom),
    );
    info!(?orchestrator, "Pipeline ready");
    Ok(create_router(ApiState::new(
        Arc::new(orchestrator),
        config.server.production,
    )))
}

/// Serve `app` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(app: Router, config: &ManzaiConfig) -> ManzaiResult<()> {
    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        ServerError::new(ServerErrorKind::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })
    })?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::new(ServerErrorKind::Serve(e.to_string())))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
    }
}
