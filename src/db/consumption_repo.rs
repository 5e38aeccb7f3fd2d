// src/db/consumption_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    common::{dates::DateRange, error::AppError},
    models::consumption::Consumption,
};

const SELECT_CONSUMPTION: &str = r#"
    SELECT c.id, c.user_id, u.full_name AS user_name, u.matricula,
           c.product_id, p.name AS product_name, p.sector_id, s.name AS sector_name,
           c.qty, c.unit_price, c.total_price, c.created_at
    FROM consumptions c
    LEFT JOIN users u ON u.id = c.user_id
    LEFT JOIN products p ON p.id = c.product_id
    LEFT JOIN sectors s ON s.id = p.sector_id
"#;

/// Filtros da listagem de consumos.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsumptionFilter {
    pub user_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub sector_id: Option<Uuid>,
    pub range: DateRange,
}

#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct PeriodAggregate {
    pub count: i64,
    pub qty: i64,
    pub total: f64,
}

#[derive(Clone)]
pub struct ConsumptionRepository {
    pool: SqlitePool,
}

impl ConsumptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        product_id: Uuid,
        qty: i64,
        unit_price: f64,
        at: DateTime<Utc>,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO consumptions (id, user_id, product_id, qty, unit_price, total_price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(product_id)
        .bind(qty)
        .bind(unit_price)
        .bind(unit_price * qty as f64)
        .bind(at)
        .execute(executor)
        .await?;
        Ok(id)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Consumption>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{SELECT_CONSUMPTION} WHERE c.id = $1");
        let row = sqlx::query_as::<_, Consumption>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Nova quantidade com o mesmo preço unitário congelado.
    pub async fn update_qty<'e, E>(&self, executor: E, id: Uuid, qty: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE consumptions SET qty = $2, total_price = unit_price * $2 WHERE id = $1",
        )
        .bind(id)
        .bind(qty)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM consumptions WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mais recentes primeiro. `limit` nulo traz tudo.
    pub async fn list(
        &self,
        filter: &ConsumptionFilter,
        limit: Option<i64>,
    ) -> Result<Vec<Consumption>, AppError> {
        let sql = format!(
            r#"{SELECT_CONSUMPTION}
            WHERE ($1 IS NULL OR c.user_id = $1)
              AND ($2 IS NULL OR c.product_id = $2)
              AND ($3 IS NULL OR p.sector_id = $3)
              AND ($4 IS NULL OR c.created_at >= $4)
              AND ($5 IS NULL OR c.created_at < $5)
            ORDER BY c.created_at DESC
            LIMIT $6"#
        );
        let rows = sqlx::query_as::<_, Consumption>(&sql)
            .bind(filter.user_id)
            .bind(filter.product_id)
            .bind(filter.sector_id)
            .bind(filter.range.from)
            .bind(filter.range.to)
            // LIMIT -1 no SQLite significa sem limite
            .bind(limit.unwrap_or(-1))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Totais de um usuário no intervalo.
    pub async fn user_totals(&self, user_id: Uuid, range: DateRange) -> Result<PeriodAggregate, AppError> {
        let totals = sqlx::query_as::<_, PeriodAggregate>(
            r#"
            SELECT COUNT(*) AS count,
                   COALESCE(SUM(qty), 0) AS qty,
                   COALESCE(SUM(total_price), 0.0) AS total
            FROM consumptions
            WHERE user_id = $1
              AND ($2 IS NULL OR created_at >= $2)
              AND ($3 IS NULL OR created_at < $3)
            "#,
        )
        .bind(user_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }
}
