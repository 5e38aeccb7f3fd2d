// src/models/consumption.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Consumo com os dados de exibição resolvidos via JOIN.
// unit_price/total_price são congelados no momento do consumo.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Consumption {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub matricula: Option<String>,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub sector_id: Option<Uuid>,
    pub sector_name: Option<String>,
    #[schema(example = 2)]
    pub qty: i64,
    #[schema(example = 2.5)]
    pub unit_price: f64,
    #[schema(example = 5.0)]
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsumptionPayload {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 1000, message = "A quantidade deve ser no mínimo 1."))]
    pub qty: i64,
    // Só administradores podem lançar para outro usuário.
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConsumptionPayload {
    #[validate(range(min = 1, max = 1000, message = "A quantidade deve ser no mínimo 1."))]
    pub qty: i64,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConsumptionQuery {
    pub user_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub sector_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

/// Resumo do mês corrente do usuário logado.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionSummary {
    pub month_count: i64,
    pub month_qty: i64,
    pub month_total: f64,
    pub monthly_limit: Option<f64>,
    pub limit_enabled: bool,
    pub remaining: Option<f64>,
}
