//! Expense database queries (SQL backend)

use anyhow::Result;
use sqlx::{Sqlite, SqlitePool};

use crate::services::month_window::MonthWindow;
use crate::types::expense::{ExpenseFields, ExpenseRecord};
use crate::types::RecordId;

#[derive(Debug, Clone, sqlx::FromRow)]
struct ExpenseRow {
    id: i64,
    #[sqlx(rename = "descricao")]
    description: Option<String>,
    #[sqlx(rename = "dataDespesaMillis")]
    expense_date_millis: Option<i64>,
    #[sqlx(rename = "valor")]
    amount: Option<f64>,
    #[sqlx(rename = "categoria")]
    category: Option<String>,
}

impl From<ExpenseRow> for ExpenseRecord {
    fn from(row: ExpenseRow) -> Self {
        ExpenseRecord {
            id: RecordId::Int(row.id),
            fields: ExpenseFields {
                description: row.description,
                expense_date_millis: row.expense_date_millis.unwrap_or_default(),
                amount: row.amount.unwrap_or_default(),
                category: row.category,
            },
        }
    }
}

pub async fn insert_expense<'e, E>(executor: E, expense: &ExpenseFields) -> Result<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO despesas (descricao, dataDespesaMillis, valor, categoria)
        VALUES (?, ?, ?, ?)
        "#
    )
    .bind(&expense.description)
    .bind(expense.expense_date_millis)
    .bind(expense.amount)
    .bind(&expense.category)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Create an expense
pub async fn create_expense(pool: &SqlitePool, expense: &ExpenseFields) -> Result<ExpenseRecord> {
    let id = insert_expense(pool, expense).await?;

    Ok(ExpenseRecord {
        id: RecordId::Int(id),
        fields: expense.clone(),
    })
}

pub async fn list_recent_expenses(pool: &SqlitePool, limit: i64) -> Result<Vec<ExpenseRecord>> {
    let rows = sqlx::query_as::<_, ExpenseRow>(
        r#"
        SELECT id, descricao, dataDespesaMillis, valor, categoria
        FROM despesas
        ORDER BY dataDespesaMillis DESC
        LIMIT ?
        "#
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ExpenseRecord::from).collect())
}

pub async fn list_expenses_in_window(pool: &SqlitePool, window: &MonthWindow) -> Result<Vec<ExpenseRecord>> {
    let rows = sqlx::query_as::<_, ExpenseRow>(
        r#"
        SELECT id, descricao, dataDespesaMillis, valor, categoria
        FROM despesas
        WHERE dataDespesaMillis BETWEEN ? AND ?
        ORDER BY dataDespesaMillis DESC
        "#
    )
    .bind(window.start_millis())
    .bind(window.end_millis())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ExpenseRecord::from).collect())
}

pub async fn update_expense(pool: &SqlitePool, id: i64, expense: &ExpenseFields) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE despesas
        SET descricao = ?, dataDespesaMillis = ?, valor = ?, categoria = ?
        WHERE id = ?
        "#
    )
    .bind(&expense.description)
    .bind(expense.expense_date_millis)
    .bind(expense.amount)
    .bind(&expense.category)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_expense(pool: &SqlitePool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM despesas WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Insert a chunk of expenses atomically
pub async fn insert_expense_batch(pool: &SqlitePool, expenses: &[ExpenseFields]) -> Result<()> {
    let mut tx = pool.begin().await?;
    for expense in expenses {
        insert_expense(&mut *tx, expense).await?;
    }
    tx.commit().await?;

    Ok(())
}
