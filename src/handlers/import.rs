//! Bulk import handler

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use super::{db_error, AppState};
use crate::error::ApiError;
use crate::services::import_processor::ImportProcessor;
use crate::types::{ImportBatch, ImportResponse};

/// POST /api/import
///
/// The payload is validated before anything is written; a store failure
/// midway leaves earlier chunks in place.
pub async fn handle_import(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImportResponse>, ApiError> {
    debug!("Received import request ({} bytes)", body.len());

    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!("Rejected import payload: {}", e);
        ApiError::invalid(format!("invalid payload: {}", e))
    })?;
    let batch = ImportBatch::from_payload(payload, Utc::now()).ok_or_else(|| {
        warn!("Rejected import payload: not a JSON object");
        ApiError::invalid("invalid payload")
    })?;

    let store = state.store.get().await?;
    let imported = ImportProcessor::new(store)
        .process(&batch)
        .await
        .map_err(db_error("import records"))?;

    Ok(Json(ImportResponse { ok: true, imported }))
}
