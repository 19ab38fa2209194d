//! HTTP handlers

pub mod expense;
pub mod health;
pub mod import;
pub mod metrics;
pub mod route;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::db::{Listing, StoreHandle};
use crate::defaults::RECENT_LIST_LIMIT;
use crate::error::ApiError;
use crate::services::month_window::{parse_period_param, MonthWindow};
use crate::types::MonthQuery;

/// State shared with every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StoreHandle>,
    /// Unit value for the monthly loose-package metric
    pub avulso_unit: f64,
}

impl AppState {
    pub fn new(store: StoreHandle, avulso_unit: f64) -> Self {
        Self {
            store: Arc::new(store),
            avulso_unit,
        }
    }
}

/// Build the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::handle_index))
        .route("/health", get(health::handle_health))
        .route("/health/db", get(health::handle_db_health))
        .route("/api/rotas", post(route::handle_create).get(route::handle_list))
        .route("/api/rotas/:id", put(route::handle_update).delete(route::handle_delete))
        .route("/api/despesas", post(expense::handle_create).get(expense::handle_list))
        .route("/api/despesas/:id", put(expense::handle_update).delete(expense::handle_delete))
        .route("/api/metrics/avulso-mes", get(metrics::handle_avulso_month))
        .route("/api/import", post(import::handle_import))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Parse a JSON object request body; an empty body reads as `{}`
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_value(Value::Object(Map::new()))
            .map_err(|e| ApiError::invalid(format!("invalid JSON body: {}", e)));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::invalid(format!("invalid JSON body: {}", e)))?;
    if !value.is_object() {
        return Err(ApiError::invalid("JSON body must be an object"));
    }
    serde_json::from_value(value).map_err(|e| ApiError::invalid(format!("invalid JSON body: {}", e)))
}

/// Listing for an optional `year`/`month` query.
///
/// Either value missing (or zero, or not a number) selects the capped recent
/// listing; both present but outside the calendar is a client error.
pub(crate) fn listing_for(query: &MonthQuery) -> Result<Listing, ApiError> {
    let year = parse_period_param(query.year.as_deref());
    let month = parse_period_param(query.month.as_deref());

    match (year, month) {
        (Some(year), Some(month)) => MonthWindow::from_query(year, month)
            .map(Listing::Month)
            .ok_or_else(|| ApiError::invalid(format!("invalid year/month: {}/{}", year, month))),
        _ => Ok(Listing::Recent {
            limit: RECENT_LIST_LIMIT,
        }),
    }
}

/// Log a store failure and turn it into a 500
pub(crate) fn db_error(action: &'static str) -> impl FnOnce(anyhow::Error) -> ApiError {
    move |e| {
        error!("Failed to {}: {:#}", action, e);
        ApiError::Database(e)
    }
}
