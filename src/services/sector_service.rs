// src/services/sector_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::SectorRepository,
    models::sector::{Sector, SectorPayload},
};

#[derive(Clone)]
pub struct SectorService {
    sector_repo: SectorRepository,
}

impl SectorService {
    pub fn new(sector_repo: SectorRepository) -> Self {
        Self { sector_repo }
    }

    pub async fn list(&self) -> Result<Vec<Sector>, AppError> {
        self.sector_repo.list().await
    }

    pub async fn create(&self, payload: &SectorPayload) -> Result<Sector, AppError> {
        self.sector_repo.create(&payload.name).await
    }

    pub async fn update(&self, id: Uuid, payload: &SectorPayload) -> Result<Sector, AppError> {
        self.sector_repo
            .update(id, &payload.name)
            .await?
            .ok_or_else(|| AppError::not_found("Setor"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.sector_repo.delete(id).await? {
            return Err(AppError::not_found("Setor"));
        }
        Ok(())
    }
}
