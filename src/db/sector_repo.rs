// src/db/sector_repo.rs

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    common::error::{AppError, map_constraint_error},
    models::sector::Sector,
};

const DUPLICATE_SECTOR: &str = "Já existe um setor com este nome.";

#[derive(Clone)]
pub struct SectorRepository {
    pool: SqlitePool,
}

impl SectorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Sector>, AppError> {
        let sectors = sqlx::query_as::<_, Sector>("SELECT * FROM sectors ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(sectors)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Sector>, AppError> {
        let sector = sqlx::query_as::<_, Sector>("SELECT * FROM sectors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sector)
    }

    /// Busca por nome sem diferenciar maiúsculas/minúsculas (usada na importação).
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Sector>, AppError> {
        let sector = sqlx::query_as::<_, Sector>(
            "SELECT * FROM sectors WHERE lower(name) = lower($1) LIMIT 1",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(sector)
    }

    pub async fn create(&self, name: &str) -> Result<Sector, AppError> {
        sqlx::query_as::<_, Sector>(
            "INSERT INTO sectors (id, name, created_at) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name.trim())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, DUPLICATE_SECTOR, ""))
    }

    pub async fn update(&self, id: Uuid, name: &str) -> Result<Option<Sector>, AppError> {
        sqlx::query_as::<_, Sector>("UPDATE sectors SET name = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, DUPLICATE_SECTOR, ""))
    }

    /// Produtos do setor ficam sem setor (`ON DELETE SET NULL`).
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sectors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sectors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
