// src/db/report_repo.rs

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    common::{dates::DateRange, error::AppError},
    models::report::ConsumptionFact,
};

/// Contagens de catálogo usadas no dashboard.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct CatalogCounts {
    pub total_products: i64,
    pub active_products: i64,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
    pub total_stock_value: f64,
}

// Leitura crua para os relatórios; as agregações são feitas no serviço.
#[derive(Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn catalog_counts(&self) -> Result<CatalogCounts, AppError> {
        let counts = sqlx::query_as::<_, CatalogCounts>(
            r#"
            SELECT
                COUNT(*) AS total_products,
                COALESCE(SUM(CASE WHEN status = 'Ativo' THEN 1 ELSE 0 END), 0) AS active_products,
                COALESCE(SUM(CASE WHEN stock_quantity <= low_stock_threshold THEN 1 ELSE 0 END), 0) AS low_stock_count,
                COALESCE(SUM(CASE WHEN stock_quantity = 0 THEN 1 ELSE 0 END), 0) AS out_of_stock_count,
                COALESCE(SUM(stock_quantity * unit_price), 0.0) AS total_stock_value
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    /// Consumos no intervalo, com o setor atual do produto.
    pub async fn consumption_facts(
        &self,
        range: DateRange,
        sector_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> Result<Vec<ConsumptionFact>, AppError> {
        let facts = sqlx::query_as::<_, ConsumptionFact>(
            r#"
            SELECT c.user_id, c.product_id, p.sector_id, c.qty, c.total_price, c.created_at
            FROM consumptions c
            JOIN products p ON p.id = c.product_id
            WHERE ($1 IS NULL OR c.created_at >= $1)
              AND ($2 IS NULL OR c.created_at < $2)
              AND ($3 IS NULL OR p.sector_id = $3)
              AND ($4 IS NULL OR c.user_id = $4)
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .bind(sector_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(facts)
    }
}
