//! Service health and fallback handlers

use axum::{extract::State, http::StatusCode, http::Uri, Json};
use boatyard_core::monitoring::HealthCheckResponse;

use super::super::types::RouteNotFoundResponse;
use super::super::SharedState;

/// GET / - Overall health, 503 when the service cannot serve requests
pub(crate) async fn health(
    State(state): State<SharedState>,
) -> (StatusCode, Json<HealthCheckResponse>) {
    let report = state.health.check_health();
    let status = if report.status.is_operational() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

/// Any unmatched route
pub(crate) async fn route_not_found(uri: Uri) -> (StatusCode, Json<RouteNotFoundResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(RouteNotFoundResponse {
            error: "Route not found".to_string(),
            path: uri.path().to_string(),
        }),
    )
}
