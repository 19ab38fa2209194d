//! Metric handlers

use axum::extract::{Query, State};
use axum::Json;
use tracing::debug;

use super::{db_error, AppState};
use crate::error::ApiError;
use crate::services::metrics::monthly_loose_total;
use crate::services::month_window::{parse_period_param, MonthWindow};
use crate::types::{MetricResponse, MonthQuery};

/// GET /api/metrics/avulso-mes?year=YYYY&month=MM
///
/// Unlike the list endpoints there is no fallback: both parameters are
/// required and must name a real month.
pub async fn handle_avulso_month(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MetricResponse>, ApiError> {
    debug!("Received metrics.avulso-mes request");

    let (year, month) = match (
        parse_period_param(query.year.as_deref()),
        parse_period_param(query.month.as_deref()),
    ) {
        (Some(year), Some(month)) => (year, month),
        _ => return Err(ApiError::invalid("year and month are required")),
    };
    let window = MonthWindow::from_query(year, month)
        .ok_or_else(|| ApiError::invalid(format!("invalid year/month: {}/{}", year, month)))?;

    let store = state.store.get().await?;
    let total = monthly_loose_total(store.as_ref(), &window, state.avulso_unit)
        .await
        .map_err(db_error("compute loose-package metric"))?;

    Ok(Json(MetricResponse { total }))
}
