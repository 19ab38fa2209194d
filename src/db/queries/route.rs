//! Route database queries (SQL backend)

use anyhow::Result;
use sqlx::{Sqlite, SqlitePool};

use crate::services::month_window::MonthWindow;
use crate::types::route::{RouteFields, RouteRecord};
use crate::types::RecordId;

/// Raw `rotas` row. Legacy rows may hold NULLs in any column.
#[derive(Debug, Clone, sqlx::FromRow)]
struct RouteRow {
    id: i64,
    #[sqlx(rename = "nomeRota")]
    name: Option<String>,
    #[sqlx(rename = "dataRotaMillis")]
    route_date_millis: Option<i64>,
    #[sqlx(rename = "placaCarro")]
    license_plate: Option<String>,
    #[sqlx(rename = "quantidadePacotes")]
    package_count: Option<i64>,
    #[sqlx(rename = "pacotesVulso")]
    loose_package_count: Option<i64>,
    #[sqlx(rename = "tipoVeiculo")]
    vehicle_type: Option<String>,
    #[sqlx(rename = "valorCalculado")]
    computed_value: Option<f64>,
}

impl From<RouteRow> for RouteRecord {
    fn from(row: RouteRow) -> Self {
        RouteRecord {
            id: RecordId::Int(row.id),
            fields: RouteFields {
                name: row.name,
                route_date_millis: row.route_date_millis.unwrap_or_default(),
                license_plate: row.license_plate,
                package_count: row.package_count.unwrap_or_default(),
                loose_package_count: row.loose_package_count.unwrap_or_default(),
                vehicle_type: row.vehicle_type,
                computed_value: row.computed_value,
            },
        }
    }
}

/// Insert a route through any executor (pool or open transaction), returning the row id
pub async fn insert_route<'e, E>(executor: E, route: &RouteFields) -> Result<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO rotas (nomeRota, dataRotaMillis, placaCarro, quantidadePacotes, pacotesVulso, tipoVeiculo, valorCalculado)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#
    )
    .bind(&route.name)
    .bind(route.route_date_millis)
    .bind(&route.license_plate)
    .bind(route.package_count)
    .bind(route.loose_package_count)
    .bind(&route.vehicle_type)
    .bind(route.computed_value)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Create a route
pub async fn create_route(pool: &SqlitePool, route: &RouteFields) -> Result<RouteRecord> {
    let id = insert_route(pool, route).await?;

    Ok(RouteRecord {
        id: RecordId::Int(id),
        fields: route.clone(),
    })
}

/// Most recent routes, newest first
pub async fn list_recent_routes(pool: &SqlitePool, limit: i64) -> Result<Vec<RouteRecord>> {
    let rows = sqlx::query_as::<_, RouteRow>(
        r#"
        SELECT id, nomeRota, dataRotaMillis, placaCarro, quantidadePacotes, pacotesVulso, tipoVeiculo, valorCalculado
        FROM rotas
        ORDER BY dataRotaMillis DESC
        LIMIT ?
        "#
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(RouteRecord::from).collect())
}

/// Routes inside a month window, newest first
pub async fn list_routes_in_window(pool: &SqlitePool, window: &MonthWindow) -> Result<Vec<RouteRecord>> {
    let rows = sqlx::query_as::<_, RouteRow>(
        r#"
        SELECT id, nomeRota, dataRotaMillis, placaCarro, quantidadePacotes, pacotesVulso, tipoVeiculo, valorCalculado
        FROM rotas
        WHERE dataRotaMillis BETWEEN ? AND ?
        ORDER BY dataRotaMillis DESC
        "#
    )
    .bind(window.start_millis())
    .bind(window.end_millis())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(RouteRecord::from).collect())
}

/// Replace every field of a route; returns the number of rows changed
pub async fn update_route(pool: &SqlitePool, id: i64, route: &RouteFields) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE rotas
        SET nomeRota = ?, dataRotaMillis = ?, placaCarro = ?, quantidadePacotes = ?,
            pacotesVulso = ?, tipoVeiculo = ?, valorCalculado = ?
        WHERE id = ?
        "#
    )
    .bind(&route.name)
    .bind(route.route_date_millis)
    .bind(&route.license_plate)
    .bind(route.package_count)
    .bind(route.loose_package_count)
    .bind(&route.vehicle_type)
    .bind(route.computed_value)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Delete a route; returns the number of rows removed
pub async fn delete_route(pool: &SqlitePool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM rotas WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Sum of loose packages inside a window, NULLs counted as zero.
/// `TOTAL` sums in floating point and cannot overflow.
pub async fn sum_loose_packages(pool: &SqlitePool, window: &MonthWindow) -> Result<f64> {
    let total: f64 = sqlx::query_scalar(
        r#"
        SELECT TOTAL(pacotesVulso)
        FROM rotas
        WHERE dataRotaMillis BETWEEN ? AND ?
        "#
    )
    .bind(window.start_millis())
    .bind(window.end_millis())
    .fetch_one(pool)
    .await?;

    Ok(total)
}

/// Insert a chunk of routes atomically
pub async fn insert_route_batch(pool: &SqlitePool, routes: &[RouteFields]) -> Result<()> {
    let mut tx = pool.begin().await?;
    for route in routes {
        insert_route(&mut *tx, route).await?;
    }
    tx.commit().await?;

    Ok(())
}
