//! HTTP server setup and routing

use crate::config::Config;
use crate::error::{Error, Result};
use crate::state::SharedState;
use crate::sync::EngineHandle;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
///
/// AppContext implements Clone, which gives us `FromRef<AppContext>` for
/// free via Axum's blanket implementation.
#[derive(Clone)]
pub struct AppContext {
    pub shared: Arc<SharedState>,
    pub engine: EngineHandle,
}

/// Build the router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // On-air state and control
        .route("/onair/state", get(super::handlers::get_state))
        .route("/onair/field/:name", post(super::handlers::set_field))
        .route("/onair/airing/start", post(super::handlers::start_airing))
        .route("/onair/airing/cancel", post(super::handlers::cancel_airing))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

/// Run the HTTP API server until shutdown
pub async fn run(config: &Config, shared: Arc<SharedState>, engine: EngineHandle) -> Result<()> {
    let app = create_router(AppContext { shared, engine });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind {}: {}", config.bind_addr, e)))?;
    info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Http(e.to_string()))
}
