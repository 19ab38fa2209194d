//! Database module
//!
//! [`RecordStore`] is the persistence capability every handler works
//! against. Two backends implement it:
//! - [`SqlStore`] - parameterized SQL over SQLite (edge deployment schema)
//! - [`DocumentStore`] - MongoDB collections (server and serverless deployments)
//!
//! [`StoreHandle`] owns the one process-wide store and opens it lazily.

pub mod document;
pub mod queries;
pub mod sql;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::{StoreBackend, StoreConfig};
use crate::error::ApiError;
use crate::services::month_window::MonthWindow;
use crate::types::{ExpenseFields, ExpenseRecord, RouteFields, RouteRecord};

pub use document::DocumentStore;
pub use sql::SqlStore;

/// Which records a list operation returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// Newest first, capped at `limit`
    Recent { limit: i64 },
    /// Every record inside the window, newest first
    Month(MonthWindow),
}

/// Persistence capability shared by all deployments
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Backend name for logging and `/health/db`
    fn name(&self) -> &'static str;

    fn database_name(&self) -> &str;

    /// Create tables/collections and date indexes when missing
    async fn ensure_schema(&self) -> Result<()>;

    /// Names of the tables/collections present
    async fn collections(&self) -> Result<Vec<String>>;

    async fn create_route(&self, route: &RouteFields) -> Result<RouteRecord>;
    async fn list_routes(&self, listing: Listing) -> Result<Vec<RouteRecord>>;
    /// Replace all fields of the route with `id`; returns records changed (0 or 1)
    async fn update_route(&self, id: &str, route: &RouteFields) -> Result<u64>;
    /// Returns records removed (0 or 1)
    async fn delete_route(&self, id: &str) -> Result<u64>;

    async fn create_expense(&self, expense: &ExpenseFields) -> Result<ExpenseRecord>;
    async fn list_expenses(&self, listing: Listing) -> Result<Vec<ExpenseRecord>>;
    async fn update_expense(&self, id: &str, expense: &ExpenseFields) -> Result<u64>;
    async fn delete_expense(&self, id: &str) -> Result<u64>;

    /// Sum of loose packages over routes dated inside `window`
    async fn sum_loose_packages(&self, window: &MonthWindow) -> Result<f64>;

    /// Write one import chunk as a single batch
    async fn insert_route_batch(&self, routes: &[RouteFields]) -> Result<()>;
    async fn insert_expense_batch(&self, expenses: &[ExpenseFields]) -> Result<()>;
}

/// Open the backend selected by configuration
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match config.backend {
        StoreBackend::Sql => Arc::new(SqlStore::connect(&config.url, &config.database_name).await?),
        StoreBackend::Document => {
            Arc::new(DocumentStore::connect(&config.url, &config.database_name).await?)
        }
    };
    Ok(store)
}

/// Lazily opened, process-lifetime record store.
///
/// The first caller opens the store and runs schema setup; concurrent first
/// callers wait on that single initialization. A failed open leaves the handle
/// empty so the next request retries.
pub struct StoreHandle {
    config: Option<StoreConfig>,
    store: OnceCell<Arc<dyn RecordStore>>,
}

impl StoreHandle {
    pub fn new(config: Option<StoreConfig>) -> Self {
        Self {
            config,
            store: OnceCell::new(),
        }
    }

    /// Handle around an already opened store
    pub fn with_store(store: Arc<dyn RecordStore>) -> Self {
        Self {
            config: None,
            store: OnceCell::new_with(Some(store)),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some() || self.store.initialized()
    }

    pub async fn get(&self) -> Result<Arc<dyn RecordStore>, ApiError> {
        if let Some(store) = self.store.get() {
            return Ok(Arc::clone(store));
        }

        let config = self.config.as_ref().ok_or(ApiError::NotConfigured)?;

        let store = self
            .store
            .get_or_try_init(|| async {
                let store = open_store(config).await?;
                match store.ensure_schema().await {
                    Ok(()) => info!("{} store ready", store.name()),
                    Err(e) => warn!("Schema setup failed on {} store: {:#}", store.name(), e),
                }
                Ok::<_, anyhow::Error>(store)
            })
            .await?;

        Ok(Arc::clone(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_handle_reports_not_configured() {
        let handle = StoreHandle::new(None);
        assert!(!handle.is_configured());
        assert!(matches!(handle.get().await, Err(ApiError::NotConfigured)));
    }

    #[tokio::test]
    async fn preset_handle_returns_same_store() {
        let store: Arc<dyn RecordStore> = Arc::new(SqlStore::in_memory().await.unwrap());
        let handle = StoreHandle::with_store(Arc::clone(&store));
        assert!(handle.is_configured());

        let first = handle.get().await.unwrap();
        let second = handle.get().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &store));
    }

    #[tokio::test]
    async fn lazy_handle_opens_sql_store_once() {
        let handle = Arc::new(StoreHandle::new(Some(StoreConfig {
            url: "sqlite::memory:".to_string(),
            database_name: "rotamelli".to_string(),
            backend: StoreBackend::Sql,
        })));

        let (a, b) = tokio::join!(handle.get(), handle.get());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.name(), "sql");
        assert_eq!(a.database_name(), "rotamelli");
    }
}
