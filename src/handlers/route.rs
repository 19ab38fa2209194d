//! Route handlers (`/api/rotas`)

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tracing::debug;

use super::{db_error, listing_for, parse_body, AppState};
use crate::error::ApiError;
use crate::services::coerce::DateStyle;
use crate::types::{ChangesResponse, MonthQuery, RouteInput, RouteRecord};

/// POST /api/rotas
pub async fn handle_create(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<RouteRecord>), ApiError> {
    debug!("Received rotas.create request");

    let store = state.store.get().await?;
    let input: RouteInput = parse_body(&body)?;
    let fields = input.normalize(DateStyle::Local, Utc::now());

    let record = store
        .create_route(&fields)
        .await
        .map_err(db_error("create route"))?;

    debug!("Created route {}", record.id);
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/rotas?year=YYYY&month=MM
pub async fn handle_list(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<RouteRecord>>, ApiError> {
    debug!("Received rotas.list request");

    let store = state.store.get().await?;
    let listing = listing_for(&query)?;

    let routes = store
        .list_routes(listing)
        .await
        .map_err(db_error("list routes"))?;

    Ok(Json(routes))
}

/// PUT /api/rotas/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ChangesResponse>, ApiError> {
    debug!("Received rotas.update request for {}", id);

    let store = state.store.get().await?;
    let input: RouteInput = parse_body(&body)?;
    let fields = input.normalize(DateStyle::Local, Utc::now());

    let changes = store
        .update_route(&id, &fields)
        .await
        .map_err(db_error("update route"))?;

    Ok(Json(ChangesResponse::new(changes)))
}

/// DELETE /api/rotas/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChangesResponse>, ApiError> {
    debug!("Received rotas.delete request for {}", id);

    let store = state.store.get().await?;
    let changes = store
        .delete_route(&id)
        .await
        .map_err(db_error("delete route"))?;

    Ok(Json(ChangesResponse::new(changes)))
}
