// src/db/stock_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    common::{dates::DateRange, error::AppError},
    models::stock::{StockTransaction, TransactionType},
};

const SELECT_TRANSACTION: &str = r#"
    SELECT t.id, t.product_id, p.name AS product_name, t.user_id, u.full_name AS user_name,
           t.change, t.transaction_type, t.reason, t.notes, t.document_origin, t.created_at
    FROM stock_transactions t
    LEFT JOIN products p ON p.id = t.product_id
    LEFT JOIN users u ON u.id = t.user_id
"#;

/// Dados de uma nova movimentação.
#[derive(Debug, Clone)]
pub struct NewTransaction<'a> {
    pub product_id: Uuid,
    pub user_id: Option<Uuid>,
    pub change: i64,
    pub transaction_type: TransactionType,
    pub reason: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub document_origin: Option<&'a str>,
}

#[derive(Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        tx: &NewTransaction<'_>,
        at: DateTime<Utc>,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO stock_transactions
                (id, product_id, user_id, change, transaction_type, reason, notes, document_origin, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(tx.product_id)
        .bind(tx.user_id)
        .bind(tx.change)
        .bind(tx.transaction_type)
        .bind(tx.reason)
        .bind(tx.notes)
        .bind(tx.document_origin)
        .bind(at)
        .execute(executor)
        .await?;
        Ok(id)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<StockTransaction>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{SELECT_TRANSACTION} WHERE t.id = $1");
        let tx = sqlx::query_as::<_, StockTransaction>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(tx)
    }

    /// Histórico mais recente primeiro.
    pub async fn list(
        &self,
        product_id: Option<Uuid>,
        kind: Option<TransactionType>,
        range: DateRange,
        limit: i64,
    ) -> Result<Vec<StockTransaction>, AppError> {
        let sql = format!(
            r#"{SELECT_TRANSACTION}
            WHERE ($1 IS NULL OR t.product_id = $1)
              AND ($2 IS NULL OR t.transaction_type = $2)
              AND ($3 IS NULL OR t.created_at >= $3)
              AND ($4 IS NULL OR t.created_at < $4)
            ORDER BY t.created_at DESC
            LIMIT $5"#
        );
        let rows = sqlx::query_as::<_, StockTransaction>(&sql)
            .bind(product_id)
            .bind(kind)
            .bind(range.from)
            .bind(range.to)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM stock_transactions WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
