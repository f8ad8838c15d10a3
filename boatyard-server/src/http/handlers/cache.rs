//! Cache administration handlers

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use boatyard_core::monitoring::collect_stats;

use super::super::types::{CacheHealthResponse, MessageResponse, StatsFormat, StatsQuery};
use super::super::{AppError, SharedState};

/// GET /cache/stats - Store info plus cache and limiter counters
///
/// JSON by default; `?format=text` returns the `# Section` / `field:value`
/// rendering.
pub(crate) async fn cache_stats(
    State(state): State<SharedState>,
    Query(query): Query<StatsQuery>,
) -> Result<Response, AppError> {
    let report = collect_stats(
        state.store.as_ref(),
        state.service.cache().stats(),
        state.limiter.as_ref(),
    )?;

    Ok(match query.format {
        StatsFormat::Json => Json(report).into_response(),
        StatsFormat::Text => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            report.to_string(),
        )
            .into_response(),
    })
}

/// POST /cache/clear-cache - Drop every cached entry and limiter counter
pub(crate) async fn clear_cache(
    State(state): State<SharedState>,
) -> Result<Json<MessageResponse>, AppError> {
    state.store.flush_all()?;
    tracing::info!("Cache cleared");
    Ok(Json(MessageResponse::new("Cache cleared successfully")))
}

/// GET /cache/health
pub(crate) async fn cache_health(State(state): State<SharedState>) -> impl IntoResponse {
    match state.store.ping() {
        Ok(pong) => (
            StatusCode::OK,
            Json(CacheHealthResponse {
                status: "ok".to_string(),
                ping: Some(pong),
                message: "Cache is operational".to_string(),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Cache health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CacheHealthResponse {
                    status: "error".to_string(),
                    ping: None,
                    message: "Cache is unavailable".to_string(),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
