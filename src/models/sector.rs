// src/models/sector.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    pub id: Uuid,
    #[schema(example = "Máquina de Café")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectorPayload {
    #[validate(length(min = 1, max = 100, message = "O nome do setor é obrigatório."))]
    #[schema(example = "Copa")]
    pub name: String,
}
