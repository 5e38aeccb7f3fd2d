// src/db/product_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    common::error::{AppError, map_constraint_error},
    models::{
        product::{NewProduct, Product, ProductQuery, ProductStatus},
        stock::StockDelta,
    },
};

const DUPLICATE_PRODUCT: &str = "Produto já cadastrado.";
const PRODUCT_IN_USE: &str =
    "Não é possível excluir o produto: existem consumos registrados para ele.";

// Todas as leituras trazem o nome do setor.
const SELECT_PRODUCT: &str = r#"
    SELECT p.*, s.name AS sector_name
    FROM products p
    LEFT JOIN sectors s ON s.id = p.sector_id
"#;

#[derive(Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &ProductQuery) -> Result<Vec<Product>, AppError> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let sql = format!(
            r#"{SELECT_PRODUCT}
            WHERE ($1 IS NULL OR p.sector_id = $1)
              AND ($2 IS NULL OR p.status = $2)
              AND ($3 IS NULL
                   OR p.name LIKE '%' || $3 || '%'
                   OR p.sku LIKE '%' || $3 || '%'
                   OR p.category LIKE '%' || $3 || '%')
            ORDER BY p.name ASC"#
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(filter.sector_id)
            .bind(filter.status)
            .bind(search)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Catálogo visível para usuários comuns.
    pub async fn list_available(&self) -> Result<Vec<Product>, AppError> {
        let sql = format!(
            "{SELECT_PRODUCT} WHERE p.status = $1 AND p.visible = 1 ORDER BY p.name ASC"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(ProductStatus::Ativo)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn list_all(&self) -> Result<Vec<Product>, AppError> {
        let sql = format!("{SELECT_PRODUCT} ORDER BY p.name ASC");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn list_low_stock(&self) -> Result<Vec<Product>, AppError> {
        let sql = format!(
            "{SELECT_PRODUCT} WHERE p.stock_quantity <= p.low_stock_threshold
             ORDER BY p.stock_quantity ASC, p.name ASC"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{SELECT_PRODUCT} WHERE p.id = $1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    /// Insere o produto com estoque e contadores zerados; o estoque inicial
    /// entra depois como movimentação.
    pub async fn create<'e, E>(&self, executor: E, new: &NewProduct) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, sector_id, sku, category, unit, unit_price, sale_price,
                stock_quantity, min_quantity, max_quantity, total_in, total_out,
                low_stock_threshold, supplier, expiration_date, status, visible,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $10, 0, 0, $11, $12, $13, $14, $15, $16, $16)
            "#,
        )
        .bind(id)
        .bind(&new.name)
        .bind(new.sector_id)
        .bind(&new.sku)
        .bind(&new.category)
        .bind(&new.unit)
        .bind(new.unit_price)
        .bind(new.sale_price)
        .bind(new.min_quantity)
        .bind(new.max_quantity)
        .bind(new.low_stock_threshold)
        .bind(&new.supplier)
        .bind(new.expiration_date)
        .bind(new.status)
        .bind(new.visible)
        .bind(now)
        .execute(executor)
        .await
        .map_err(|e| map_constraint_error(e, DUPLICATE_PRODUCT, "Setor informado não existe."))?;
        Ok(id)
    }

    /// Atualiza os campos cadastrais. Estoque e contadores não são tocados.
    pub async fn update(&self, id: Uuid, data: &NewProduct) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = $2,
                sector_id = $3,
                sku = $4,
                category = $5,
                unit = $6,
                unit_price = $7,
                sale_price = $8,
                min_quantity = $9,
                max_quantity = $10,
                low_stock_threshold = $11,
                supplier = $12,
                expiration_date = $13,
                status = $14,
                visible = $15,
                updated_at = $16
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(data.sector_id)
        .bind(&data.sku)
        .bind(&data.category)
        .bind(&data.unit)
        .bind(data.unit_price)
        .bind(data.sale_price)
        .bind(data.min_quantity)
        .bind(data.max_quantity)
        .bind(data.low_stock_threshold)
        .bind(&data.supplier)
        .bind(data.expiration_date)
        .bind(data.status)
        .bind(data.visible)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, DUPLICATE_PRODUCT, "Setor informado não existe."))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_photo(&self, id: Uuid, photo_path: Option<&str>) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE products SET photo_path = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(photo_path)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Aplica o delta de estoque numa única instrução condicional.
    /// Retorna `false` se o produto não existe ou se o estoque ficaria negativo.
    pub async fn apply_delta<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        delta: StockDelta,
        restocked_at: Option<DateTime<Utc>>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                stock_quantity = stock_quantity + $2,
                total_in = total_in + $3,
                total_out = total_out + $4,
                last_restock_at = COALESCE($5, last_restock_at),
                updated_at = $6
            WHERE id = $1 AND stock_quantity + $2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta.stock)
        .bind(delta.total_in)
        .bind(delta.total_out)
        .bind(restocked_at)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, DUPLICATE_PRODUCT, PRODUCT_IN_USE))?;
        Ok(result.rows_affected() > 0)
    }
}
