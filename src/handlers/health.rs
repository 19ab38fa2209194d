//! Index and health check handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;

use super::{db_error, AppState};
use crate::error::ApiError;
use crate::types::{DbHealthResponse, ErrorResponse, IndexResponse, OkResponse};

const ENDPOINTS: &[&str] = &[
    "GET /health",
    "GET /health/db",
    "POST /api/rotas",
    "GET  /api/rotas?year=YYYY&month=MM",
    "PUT /api/rotas/:id",
    "DELETE /api/rotas/:id",
    "POST /api/despesas",
    "GET  /api/despesas?year=YYYY&month=MM",
    "PUT /api/despesas/:id",
    "DELETE /api/despesas/:id",
    "GET  /api/metrics/avulso-mes?year=YYYY&month=MM",
    "POST /api/import",
];

/// GET /
pub async fn handle_index() -> Json<IndexResponse> {
    Json(IndexResponse {
        name: "rota-ml-api".to_string(),
        status: "ok".to_string(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

/// GET /health - always 200
pub async fn handle_health() -> Json<OkResponse> {
    Json(OkResponse::ok())
}

/// GET /health/db - 400 when no database is configured
pub async fn handle_db_health(State(state): State<AppState>) -> Result<Response, ApiError> {
    debug!("Received health.db request");

    if !state.store.is_configured() {
        let body = ErrorResponse::new("NOT_CONFIGURED", "missing DATABASE_URL");
        return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }

    let store = state.store.get().await?;
    let collections = store
        .collections()
        .await
        .map_err(db_error("list collections"))?;

    Ok(Json(DbHealthResponse {
        ok: true,
        db: store.database_name().to_string(),
        backend: store.name().to_string(),
        collections,
    })
    .into_response())
}
