//! HTTP API server
//!
//! ## Endpoints
//!
//! ### Boats
//! - `GET /boats` - List boats (filters: `type`, `minYear`, `maxYear`,
//!   `minPrice`, `maxPrice`, `isAvailable`)
//! - `POST /boats` - Create a boat
//! - `GET /boats/{id}` - Get a boat
//! - `PUT /boats/{id}` - Update a boat
//! - `DELETE /boats/{id}` - Delete a boat
//!
//! ### Cache
//! - `GET /cache/stats` - Store, cache and rate limiter statistics
//!   (`?format=text` for the `# Section` text form)
//! - `POST /cache/clear-cache` - Flush the store
//! - `GET /cache/health` - Ping the store
//!
//! ### System
//! - `GET /` - Health check
//!
//! Every route, including unknown ones, counts against the caller's rate
//! limit window.

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use boatyard_core::kvs::KeyValueStore;
use boatyard_core::monitoring::HealthChecker;
use boatyard_core::ratelimit::RateLimiter;
use boatyard_core::service::BoatService;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod types;

pub use error::AppError;

use handlers::{
    cache_health, cache_stats, clear_cache, create_boat, delete_boat, get_boat, health,
    list_boats, route_not_found, update_boat,
};

/// Shared application state for HTTP handlers
pub struct AppState {
    pub service: BoatService,
    /// None when rate limiting is disabled
    pub limiter: Option<RateLimiter>,
    pub store: Arc<dyn KeyValueStore>,
    pub health: HealthChecker,
}

pub type SharedState = Arc<AppState>;

/// Build the router with every route and layer
pub fn router(state: SharedState) -> Router {
    Router::new()
        // System
        .route("/", get(health))
        // Boats
        .route("/boats", get(list_boats).post(create_boat))
        .route(
            "/boats/{id}",
            get(get_boat).put(update_boat).delete(delete_boat),
        )
        // Cache administration
        .route("/cache/stats", get(cache_stats))
        .route("/cache/clear-cache", post(clear_cache))
        .route("/cache/health", get(cache_health))
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves, then drain in-flight requests
pub async fn serve<F>(addr: SocketAddr, state: SharedState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!("Boatyard HTTP API listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("HTTP server error")?;

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping server...");
}
