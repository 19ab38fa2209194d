//! Relational record store over SQLite
//!
//! Speaks the same parameterized SQL as the edge deployment's database, so an
//! exported edge database file can be served directly.

use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::queries;
use super::{Listing, RecordStore};
use crate::services::month_window::MonthWindow;
use crate::types::{ExpenseFields, ExpenseRecord, RouteFields, RouteRecord};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS rotas (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nomeRota TEXT,
        dataRotaMillis INTEGER NOT NULL,
        placaCarro TEXT,
        quantidadePacotes INTEGER DEFAULT 0,
        pacotesVulso INTEGER DEFAULT 0,
        tipoVeiculo TEXT,
        valorCalculado REAL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS despesas (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        descricao TEXT,
        dataDespesaMillis INTEGER NOT NULL,
        valor REAL DEFAULT 0,
        categoria TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_rotas_data ON rotas (dataRotaMillis DESC)",
    "CREATE INDEX IF NOT EXISTS idx_despesas_data ON despesas (dataDespesaMillis DESC)",
];

/// SQL-backed [`RecordStore`]
pub struct SqlStore {
    pool: SqlitePool,
    database_name: String,
}

impl SqlStore {
    /// Open a connection pool for a `sqlite:` URL, creating the file if missing.
    /// In-memory URLs get one pinned connection so the database outlives idle periods.
    pub async fn connect(url: &str, database_name: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid SQLite URL '{}'", url))?
            .create_if_missing(true);

        let pool = if is_memory_url(url) {
            memory_pool(options).await
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await
        }
        .context("failed to open SQLite database")?;

        info!("SQL store connected");
        Ok(Self {
            pool,
            database_name: database_name.to_string(),
        })
    }

    /// Private in-memory database on a single pinned connection (tests, demos)
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let store = Self {
            pool: memory_pool(options).await?,
            database_name: "memory".to_string(),
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_memory_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.contains(":memory:") || lower.contains("mode=memory")
}

/// Never closes its only connection; an in-memory database dies with it
async fn memory_pool(options: SqliteConnectOptions) -> sqlx::Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Path ids are integers here; anything else matches no row
fn parse_row_id(id: &str) -> Option<i64> {
    let parsed = id.trim().parse::<i64>().ok();
    if parsed.is_none() {
        debug!("Ignoring non-integer record id '{}'", id);
    }
    parsed
}

#[async_trait]
impl RecordStore for SqlStore {
    fn name(&self) -> &'static str {
        "sql"
    }

    fn database_name(&self) -> &str {
        &self.database_name
    }

    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn collections(&self) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn create_route(&self, route: &RouteFields) -> Result<RouteRecord> {
        queries::route::create_route(&self.pool, route).await
    }

    async fn list_routes(&self, listing: Listing) -> Result<Vec<RouteRecord>> {
        match listing {
            Listing::Recent { limit } => queries::route::list_recent_routes(&self.pool, limit).await,
            Listing::Month(window) => queries::route::list_routes_in_window(&self.pool, &window).await,
        }
    }

    async fn update_route(&self, id: &str, route: &RouteFields) -> Result<u64> {
        match parse_row_id(id) {
            Some(id) => queries::route::update_route(&self.pool, id, route).await,
            None => Ok(0),
        }
    }

    async fn delete_route(&self, id: &str) -> Result<u64> {
        match parse_row_id(id) {
            Some(id) => queries::route::delete_route(&self.pool, id).await,
            None => Ok(0),
        }
    }

    async fn create_expense(&self, expense: &ExpenseFields) -> Result<ExpenseRecord> {
        queries::expense::create_expense(&self.pool, expense).await
    }

    async fn list_expenses(&self, listing: Listing) -> Result<Vec<ExpenseRecord>> {
        match listing {
            Listing::Recent { limit } => queries::expense::list_recent_expenses(&self.pool, limit).await,
            Listing::Month(window) => queries::expense::list_expenses_in_window(&self.pool, &window).await,
        }
    }

    async fn update_expense(&self, id: &str, expense: &ExpenseFields) -> Result<u64> {
        match parse_row_id(id) {
            Some(id) => queries::expense::update_expense(&self.pool, id, expense).await,
            None => Ok(0),
        }
    }

    async fn delete_expense(&self, id: &str) -> Result<u64> {
        match parse_row_id(id) {
            Some(id) => queries::expense::delete_expense(&self.pool, id).await,
            None => Ok(0),
        }
    }

    async fn sum_loose_packages(&self, window: &MonthWindow) -> Result<f64> {
        queries::route::sum_loose_packages(&self.pool, window).await
    }

    async fn insert_route_batch(&self, routes: &[RouteFields]) -> Result<()> {
        queries::route::insert_route_batch(&self.pool, routes).await
    }

    async fn insert_expense_batch(&self, expenses: &[ExpenseFields]) -> Result<()> {
        queries::expense::insert_expense_batch(&self.pool, expenses).await
    }
}
