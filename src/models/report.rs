// src/models/report.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// --- Filtros comuns a todos os relatórios ---
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sector_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub cadence: Option<Cadence>,
    /// Janela em dias (padrão 30, máximo 365)
    pub window_days: Option<u32>,
    pub limit: Option<usize>,
    pub mode: Option<ExportMode>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    #[default]
    Consolidated,
    Detailed,
}

/// Linha mínima de consumo usada pelas agregações.
#[derive(Debug, Clone, FromRow)]
pub struct ConsumptionFact {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub sector_id: Option<Uuid>,
    pub qty: i64,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}

// --- Classificações ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LowStockSeverity {
    Out,
    Critical,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyClass {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockoutStatus {
    Critical,
    Warning,
    Ok,
    NoConsumption,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LimitStatus {
    NoLimit,
    Ok,
    NearLimit,
    Exceeded,
}

// --- 1. Dashboard ---
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: i64,
    pub active_products: i64,
    pub total_sectors: i64,
    pub total_users: i64,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
    pub total_stock_value: f64,
    pub today: PeriodTotals,
    pub month: PeriodTotals,
}

#[derive(Debug, Default, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotals {
    pub count: i64,
    pub quantity: i64,
    pub value: f64,
    pub distinct_users: usize,
}

// --- 2. Estoque baixo ---
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowStockEntry {
    pub product_id: Uuid,
    pub name: String,
    pub sector_name: Option<String>,
    pub stock_quantity: i64,
    pub low_stock_threshold: i64,
    pub min_quantity: i64,
    pub severity: LowStockSeverity,
}

// --- 3. Mais consumidos ---
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopConsumedEntry {
    pub product_id: Uuid,
    pub name: String,
    pub sector_name: Option<String>,
    pub total_qty: i64,
    pub total_value: f64,
    pub consumption_count: i64,
    pub distinct_users: usize,
}

// --- 4. Gestão por setor ---
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectorReportEntry {
    /// Nulo para o grupo de produtos sem setor
    pub sector_id: Option<Uuid>,
    pub sector_name: String,
    pub product_count: i64,
    pub total_stock: i64,
    pub stock_value: f64,
    pub low_stock_count: i64,
    pub consumed_qty: i64,
    pub consumed_value: f64,
    pub consumption_share_pct: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectorReport {
    pub sectors: Vec<SectorReportEntry>,
    pub total_consumed_value: f64,
    pub total_stock_value: f64,
}

// --- 5. Cadência da máquina de café ---
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CadencePoint {
    pub period_start: NaiveDate,
    pub quantity: i64,
    pub value: f64,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CadenceProductEntry {
    pub product_id: Uuid,
    pub name: String,
    pub total_qty: i64,
    pub avg_per_period: f64,
    pub avg_daily_consumption: f64,
    pub active_day_ratio: f64,
    pub frequency: FrequencyClass,
    pub stock_quantity: i64,
    pub days_until_stockout: Option<f64>,
    pub stockout_status: StockoutStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoffeeMachineReport {
    pub sector_id: Option<Uuid>,
    pub sector_name: Option<String>,
    pub cadence: Cadence,
    pub window_days: u32,
    pub series: Vec<CadencePoint>,
    pub products: Vec<CadenceProductEntry>,
    pub total_qty: i64,
    pub total_value: f64,
}

// --- 6. Controle de consumo por usuário ---
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserConsumptionEntry {
    pub user_id: Uuid,
    pub full_name: String,
    pub matricula: String,
    pub consumption_count: i64,
    pub total_qty: i64,
    pub total_value: f64,
    pub monthly_limit: Option<f64>,
    pub limit_usage_pct: Option<f64>,
    pub status: LimitStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionControlReport {
    pub users: Vec<UserConsumptionEntry>,
    /// Lançamentos individuais, apenas quando filtrado por usuário
    pub details: Vec<crate::models::consumption::Consumption>,
    pub total_qty: i64,
    pub total_value: f64,
    pub users_over_limit: usize,
}

// --- 7. Análise preditiva / reposição ---
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveEntry {
    pub product_id: Uuid,
    pub name: String,
    pub sector_name: Option<String>,
    pub stock_quantity: i64,
    pub window_qty: i64,
    pub avg_daily_consumption: f64,
    pub trend: Trend,
    pub days_until_stockout: Option<f64>,
    pub status: StockoutStatus,
    pub suggested_reorder_qty: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveReport {
    pub window_days: u32,
    pub products: Vec<PredictiveEntry>,
    pub critical_count: usize,
    pub warning_count: usize,
}
