//! Expense handlers (`/api/despesas`)

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tracing::debug;

use super::{db_error, listing_for, parse_body, AppState};
use crate::error::ApiError;
use crate::services::coerce::DateStyle;
use crate::types::{ChangesResponse, ExpenseInput, ExpenseRecord, MonthQuery};

/// POST /api/despesas
pub async fn handle_create(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ExpenseRecord>), ApiError> {
    debug!("Received despesas.create request");

    let store = state.store.get().await?;
    let input: ExpenseInput = parse_body(&body)?;
    let fields = input.normalize(DateStyle::Local, Utc::now());

    let record = store
        .create_expense(&fields)
        .await
        .map_err(db_error("create expense"))?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/despesas?year=YYYY&month=MM
pub async fn handle_list(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<ExpenseRecord>>, ApiError> {
    debug!("Received despesas.list request");

    let store = state.store.get().await?;
    let listing = listing_for(&query)?;

    let expenses = store
        .list_expenses(listing)
        .await
        .map_err(db_error("list expenses"))?;

    Ok(Json(expenses))
}

/// PUT /api/despesas/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ChangesResponse>, ApiError> {
    debug!("Received despesas.update request for {}", id);

    let store = state.store.get().await?;
    let input: ExpenseInput = parse_body(&body)?;
    let fields = input.normalize(DateStyle::Local, Utc::now());

    let changes = store
        .update_expense(&id, &fields)
        .await
        .map_err(db_error("update expense"))?;

    Ok(Json(ChangesResponse::new(changes)))
}

/// DELETE /api/despesas/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChangesResponse>, ApiError> {
    debug!("Received despesas.delete request for {}", id);

    let store = state.store.get().await?;
    let changes = store
        .delete_expense(&id)
        .await
        .map_err(db_error("delete expense"))?;

    Ok(Json(ChangesResponse::new(changes)))
}
