//! Bulk import processor
//!
//! Writes an [`ImportBatch`] in fixed-size chunks: all route chunks in order,
//! then all expense chunks. Each chunk is one store batch. The first failing
//! chunk aborts the import; chunks written before it stay written.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::db::RecordStore;
use crate::defaults::IMPORT_CHUNK_SIZE;
use crate::types::{ImportBatch, ImportedCounts};

pub struct ImportProcessor {
    store: Arc<dyn RecordStore>,
    chunk_size: usize,
}

impl ImportProcessor {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            chunk_size: IMPORT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Submit every record of the batch; returns how many of each kind were submitted
    pub async fn process(&self, batch: &ImportBatch) -> Result<ImportedCounts> {
        let started = Instant::now();

        let route_chunks = batch.routes.chunks(self.chunk_size).count();
        for (index, chunk) in batch.routes.chunks(self.chunk_size).enumerate() {
            debug!("Importing route chunk {}/{} ({} rows)", index + 1, route_chunks, chunk.len());
            self.store
                .insert_route_batch(chunk)
                .await
                .with_context(|| format!("route chunk {}/{} failed", index + 1, route_chunks))?;
        }

        let expense_chunks = batch.expenses.chunks(self.chunk_size).count();
        for (index, chunk) in batch.expenses.chunks(self.chunk_size).enumerate() {
            debug!("Importing expense chunk {}/{} ({} rows)", index + 1, expense_chunks, chunk.len());
            self.store
                .insert_expense_batch(chunk)
                .await
                .with_context(|| format!("expense chunk {}/{} failed", index + 1, expense_chunks))?;
        }

        let counts = ImportedCounts {
            rotas: batch.routes.len(),
            despesas: batch.expenses.len(),
        };
        info!(
            "Import finished: {} routes, {} expenses in {:?}",
            counts.rotas,
            counts.despesas,
            started.elapsed()
        );
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::db::{Listing, SqlStore};
    use crate::services::month_window::MonthWindow;
    use crate::types::{ExpenseFields, ExpenseRecord, RouteFields, RouteRecord};

    /// Records every batch call and fails the chosen one (1-based)
    #[derive(Default)]
    struct ChunkRecorder {
        fail_on_call: Option<usize>,
        calls: Mutex<Vec<(&'static str, usize)>>,
        committed_routes: Mutex<Vec<RouteFields>>,
    }

    impl ChunkRecorder {
        fn failing_on(call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                ..Self::default()
            }
        }

        fn record(&self, kind: &'static str, len: usize) -> Result<()> {
            let mut calls = self.calls.lock().unwrap();
            calls.push((kind, len));
            if self.fail_on_call == Some(calls.len()) {
                anyhow::bail!("database is locked");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RecordStore for ChunkRecorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn database_name(&self) -> &str {
            "recorder"
        }

        async fn ensure_schema(&self) -> Result<()> {
            Ok(())
        }

        async fn collections(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn create_route(&self, _route: &RouteFields) -> Result<RouteRecord> {
            anyhow::bail!("not used by imports")
        }

        async fn list_routes(&self, _listing: Listing) -> Result<Vec<RouteRecord>> {
            Ok(Vec::new())
        }

        async fn update_route(&self, _id: &str, _route: &RouteFields) -> Result<u64> {
            Ok(0)
        }

        async fn delete_route(&self, _id: &str) -> Result<u64> {
            Ok(0)
        }

        async fn create_expense(&self, _expense: &ExpenseFields) -> Result<ExpenseRecord> {
            anyhow::bail!("not used by imports")
        }

        async fn list_expenses(&self, _listing: Listing) -> Result<Vec<ExpenseRecord>> {
            Ok(Vec::new())
        }

        async fn update_expense(&self, _id: &str, _expense: &ExpenseFields) -> Result<u64> {
            Ok(0)
        }

        async fn delete_expense(&self, _id: &str) -> Result<u64> {
            Ok(0)
        }

        async fn sum_loose_packages(&self, _window: &MonthWindow) -> Result<f64> {
            Ok(0.0)
        }

        async fn insert_route_batch(&self, routes: &[RouteFields]) -> Result<()> {
            self.record("rotas", routes.len())?;
            self.committed_routes.lock().unwrap().extend_from_slice(routes);
            Ok(())
        }

        async fn insert_expense_batch(&self, expenses: &[ExpenseFields]) -> Result<()> {
            self.record("despesas", expenses.len())
        }
    }

    fn routes(n: usize) -> Vec<RouteFields> {
        (0..n)
            .map(|i| RouteFields {
                name: Some(format!("Rota {}", i)),
                route_date_millis: i as i64,
                license_plate: None,
                package_count: 1,
                loose_package_count: 1,
                vehicle_type: None,
                computed_value: None,
            })
            .collect()
    }

    fn expenses(n: usize) -> Vec<ExpenseFields> {
        (0..n)
            .map(|i| ExpenseFields {
                description: None,
                expense_date_millis: i as i64,
                amount: 10.0,
                category: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn routes_are_chunked_before_expenses() {
        let recorder = Arc::new(ChunkRecorder::default());
        let processor = ImportProcessor::new(recorder.clone());
        let batch = ImportBatch {
            routes: routes(23),
            expenses: expenses(12),
        };

        let counts = processor.process(&batch).await.unwrap();

        assert_eq!(counts, ImportedCounts { rotas: 23, despesas: 12 });
        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec![("rotas", 10), ("rotas", 10), ("rotas", 3), ("despesas", 10), ("despesas", 2)]
        );
    }

    #[tokio::test]
    async fn failing_chunk_aborts_and_keeps_earlier_chunks() {
        let recorder = Arc::new(ChunkRecorder::failing_on(2));
        let processor = ImportProcessor::new(recorder.clone());
        let batch = ImportBatch {
            routes: routes(23),
            expenses: expenses(5),
        };

        let err = processor.process(&batch).await.unwrap_err();

        assert!(format!("{:#}", err).contains("database is locked"));
        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec![("rotas", 10), ("rotas", 10)]
        );
        assert_eq!(recorder.committed_routes.lock().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn empty_batch_writes_nothing() {
        let recorder = Arc::new(ChunkRecorder::default());
        let counts = ImportProcessor::new(recorder.clone())
            .process(&ImportBatch::default())
            .await
            .unwrap();

        assert_eq!(counts, ImportedCounts::default());
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn imports_land_in_sql_store() {
        let store = Arc::new(SqlStore::in_memory().await.unwrap());
        let processor = ImportProcessor::new(store.clone()).with_chunk_size(4);
        let batch = ImportBatch {
            routes: routes(9),
            expenses: expenses(3),
        };

        processor.process(&batch).await.unwrap();

        let listed = store.list_routes(Listing::Recent { limit: 100 }).await.unwrap();
        assert_eq!(listed.len(), 9);
        let listed = store.list_expenses(Listing::Recent { limit: 100 }).await.unwrap();
        assert_eq!(listed.len(), 3);
    }

    #[tokio::test]
    async fn failing_row_rolls_back_its_whole_chunk() {
        let store = Arc::new(SqlStore::in_memory().await.unwrap());
        sqlx::query(
            r#"
            CREATE TRIGGER reject_sentinel BEFORE INSERT ON rotas
            WHEN NEW.nomeRota = 'Rota 6'
            BEGIN
                SELECT RAISE(ABORT, 'sentinel route rejected');
            END
            "#,
        )
        .execute(store.pool())
        .await
        .unwrap();

        let processor = ImportProcessor::new(store.clone()).with_chunk_size(4);
        let batch = ImportBatch {
            routes: routes(10),
            expenses: expenses(2),
        };

        let err = processor.process(&batch).await.unwrap_err();
        assert!(format!("{:#}", err).contains("route chunk 2/3 failed"));

        let mut names: Vec<String> = store
            .list_routes(Listing::Recent { limit: 100 })
            .await
            .unwrap()
            .into_iter()
            .filter_map(|r| r.fields.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Rota 0", "Rota 1", "Rota 2", "Rota 3"]);

        let expenses = store.list_expenses(Listing::Recent { limit: 100 }).await.unwrap();
        assert!(expenses.is_empty());
    }
}
