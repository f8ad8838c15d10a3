//! Boat CRUD handlers

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use boatyard_core::boat::{Boat, BoatInput, QueryParams};

use super::super::types::MessageResponse;
use super::super::{AppError, SharedState};

/// GET /boats - List boats matching the query filter
pub(crate) async fn list_boats(
    State(state): State<SharedState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Vec<Boat>>, AppError> {
    let boats = state.service.list(&params)?;
    Ok(Json(boats))
}

/// GET /boats/{id}
pub(crate) async fn get_boat(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Boat>, AppError> {
    state
        .service
        .get(&id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Boat not found".to_string()))
}

/// POST /boats
pub(crate) async fn create_boat(
    State(state): State<SharedState>,
    payload: Result<Json<BoatInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Boat>), AppError> {
    let Json(input) = payload?;
    let boat = state.service.create(&input)?;
    Ok((StatusCode::CREATED, Json(boat)))
}

/// PUT /boats/{id} - Replace a boat's fields
pub(crate) async fn update_boat(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<BoatInput>, JsonRejection>,
) -> Result<Json<Boat>, AppError> {
    let Json(input) = payload?;
    let boat = state.service.update(&id, &input)?;
    Ok(Json(boat))
}

/// DELETE /boats/{id}
pub(crate) async fn delete_boat(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.service.delete(&id)?;
    Ok(Json(MessageResponse::new("Boat deleted successfully")))
}
