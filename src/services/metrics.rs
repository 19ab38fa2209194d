//! Monthly loose-package metric

use anyhow::Result;
use tracing::debug;

use crate::db::RecordStore;
use crate::services::month_window::MonthWindow;

/// Total loose-package surcharge for a month: the sum of loose packages on
/// routes inside the window times the configured unit value. An empty month
/// totals zero.
pub async fn monthly_loose_total(
    store: &dyn RecordStore,
    window: &MonthWindow,
    unit: f64,
) -> Result<f64> {
    let packages = store.sum_loose_packages(window).await?;
    let total = packages * unit;
    debug!(
        "Loose packages {}..{}: {} x {} = {}",
        window.start, window.end, packages, unit, total
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqlStore;
    use crate::types::RouteFields;
    use chrono::{Local, TimeZone};

    fn route(millis: i64, loose: i64) -> RouteFields {
        RouteFields {
            name: None,
            route_date_millis: millis,
            license_plate: None,
            package_count: 0,
            loose_package_count: loose,
            vehicle_type: None,
            computed_value: None,
        }
    }

    #[tokio::test]
    async fn total_multiplies_sum_by_unit() {
        let store = SqlStore::in_memory().await.unwrap();
        let day = Local
            .with_ymd_and_hms(2024, 9, 3, 8, 0, 0)
            .earliest()
            .unwrap()
            .timestamp_millis();
        for loose in [3, 0, 5] {
            store.create_route(&route(day, loose)).await.unwrap();
        }
        sqlx::query("INSERT INTO rotas (dataRotaMillis, pacotesVulso) VALUES (?, NULL)")
            .bind(day)
            .execute(store.pool())
            .await
            .unwrap();

        let window = MonthWindow::local(2024, 9).unwrap();
        assert_eq!(monthly_loose_total(&store, &window, 2.0).await.unwrap(), 16.0);
        assert_eq!(monthly_loose_total(&store, &window, 2.5).await.unwrap(), 20.0);
    }

    #[tokio::test]
    async fn empty_month_totals_zero() {
        let store = SqlStore::in_memory().await.unwrap();
        let window = MonthWindow::local(2024, 10).unwrap();
        assert_eq!(monthly_loose_total(&store, &window, 2.0).await.unwrap(), 0.0);
    }
}
