// src/services/stock_service.rs

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    common::{dates::DateRange, error::AppError},
    db::{self, ProductRepository, StockRepository, stock_repo::NewTransaction},
    models::stock::{
        CreateStockTransactionPayload, StockDelta, StockTransaction, StockTransactionQuery,
        TransactionType,
    },
};

const DEFAULT_LIST_LIMIT: i64 = 100;
const MAX_LIST_LIMIT: i64 = 1000;

#[derive(Clone)]
pub struct StockService {
    pool: SqlitePool,
    product_repo: ProductRepository,
    stock_repo: StockRepository,
}

impl StockService {
    pub fn new(pool: SqlitePool, product_repo: ProductRepository, stock_repo: StockRepository) -> Self {
        Self { pool, product_repo, stock_repo }
    }

    pub async fn list(&self, query: &StockTransactionQuery) -> Result<Vec<StockTransaction>, AppError> {
        let range = DateRange::from_days(query.start_date, query.end_date)?;
        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        self.stock_repo
            .list(query.product_id, query.transaction_type, range, limit)
            .await
    }

    pub async fn post(
        &self,
        payload: &CreateStockTransactionPayload,
        user_id: Uuid,
    ) -> Result<StockTransaction, AppError> {
        let kind = payload
            .transaction_type
            .unwrap_or_else(|| TransactionType::for_change(payload.change));

        let mut tx = db::begin_write(&self.pool).await?;
        let id = self
            .record(
                &mut tx,
                NewTransaction {
                    product_id: payload.product_id,
                    user_id: Some(user_id),
                    change: payload.change,
                    transaction_type: kind,
                    reason: payload.reason.as_deref(),
                    notes: payload.notes.as_deref(),
                    document_origin: payload.document_origin.as_deref(),
                },
            )
            .await?;
        let created = self
            .stock_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Movimentação"))?;
        tx.commit().await?;

        tracing::info!(
            "📦 Movimentação {:?} de {} no produto {}",
            kind,
            payload.change,
            payload.product_id
        );
        Ok(created)
    }

    /// Registra a movimentação e aplica o delta no produto, na transação
    /// recebida. Também usado no cadastro e na importação de produtos.
    pub async fn record(
        &self,
        conn: &mut SqliteConnection,
        new: NewTransaction<'_>,
    ) -> Result<Uuid, AppError> {
        let now = Utc::now();
        let restocked_at = (new.change > 0).then_some(now);
        self.apply(&mut *conn, new.product_id, StockDelta::for_transaction(new.change), restocked_at)
            .await?;
        self.stock_repo.insert(&mut *conn, &new, now).await
    }

    /// Desfaz a movimentação sob a mesma regra de estoque não negativo.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = db::begin_write(&self.pool).await?;
        let existing = self
            .stock_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Movimentação"))?;

        self.apply(&mut tx, existing.product_id, StockDelta::reverting(existing.change), None)
            .await?;
        self.stock_repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("Movimentação {} revertida ({})", id, existing.change);
        Ok(())
    }

    /// Aplica o delta; se a atualização condicional não pegar nenhuma linha,
    /// distingue produto inexistente de estoque insuficiente.
    pub async fn apply(
        &self,
        conn: &mut SqliteConnection,
        product_id: Uuid,
        delta: StockDelta,
        restocked_at: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        if self
            .product_repo
            .apply_delta(&mut *conn, product_id, delta, restocked_at)
            .await?
        {
            return Ok(());
        }

        let product = self
            .product_repo
            .find_by_id(&mut *conn, product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Produto"))?;
        Err(AppError::InsufficientStock {
            available: product.stock_quantity,
            requested: -delta.stock,
        })
    }
}
