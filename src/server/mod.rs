//! HTTP surface: `GET /`, `POST /webhook` and `GET /metrics`.

pub mod handlers;

use crate::ingest::SignalIngestor;
use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub ingestor: Arc<SignalIngestor>,
}

impl AppState {
    pub fn new(ingestor: SignalIngestor) -> Self {
        Self { ingestor: Arc::new(ingestor) }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health_check))
        .route("/webhook", post(handlers::webhook))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = std::net::TcpListener::bind(addr)
        .with_context(|| format!("failed to bind {}", addr))?;
    serve_listener(listener, state, shutdown).await
}

/// Serve on an already bound listener (port 0 in tests).
pub async fn serve_listener<F>(
    listener: std::net::TcpListener, state: AppState, shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    listener.set_nonblocking(true).context("set listener non-blocking")?;
    let local_addr = listener.local_addr().context("listener has no local_addr")?;
    log::info!("Signal receiver listening on http://{}", local_addr);

    axum::Server::from_tcp(listener)
        .context("failed to create server from listener")?
        .serve(create_router(state).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    log::info!("Signal receiver stopped");
    Ok(())
}
