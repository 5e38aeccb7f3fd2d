// src/handlers/reports.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::consumptions::xlsx_response,
    middleware::auth::AdminUser,
    models::report::{
        CoffeeMachineReport, ConsumptionControlReport, DashboardStats, LowStockEntry,
        PredictiveReport, ReportQuery, SectorReport, TopConsumedEntry,
    },
};

#[utoipa::path(
    get,
    path = "/api/reports/dashboard",
    tag = "Reports",
    responses((status = 200, description = "Indicadores gerais", body = DashboardStats)),
    security(("api_jwt" = []))
)]
pub async fn dashboard(
    State(app_state): State<AppState>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let stats = app_state.report_service.dashboard(Utc::now()).await?;
    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    get,
    path = "/api/reports/low-stock",
    tag = "Reports",
    params(ReportQuery),
    responses((status = 200, description = "Estoque baixo com severidade", body = Vec<LowStockEntry>)),
    security(("api_jwt" = []))
)]
pub async fn low_stock(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let entries = app_state.report_service.low_stock(&query).await?;
    Ok((StatusCode::OK, Json(entries)))
}

#[utoipa::path(
    get,
    path = "/api/reports/top-consumed",
    tag = "Reports",
    params(ReportQuery),
    responses((status = 200, description = "Produtos mais consumidos no período", body = Vec<TopConsumedEntry>)),
    security(("api_jwt" = []))
)]
pub async fn top_consumed(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let entries = app_state.report_service.top_consumed(&query).await?;
    Ok((StatusCode::OK, Json(entries)))
}

#[utoipa::path(
    get,
    path = "/api/reports/sectors",
    tag = "Reports",
    params(ReportQuery),
    responses((status = 200, description = "Consumo agrupado por setor", body = SectorReport)),
    security(("api_jwt" = []))
)]
pub async fn sectors(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.report_service.sectors(&query).await?;
    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/reports/coffee-machine",
    tag = "Reports",
    params(ReportQuery),
    responses((status = 200, description = "Cadência de consumo da máquina de café", body = CoffeeMachineReport)),
    security(("api_jwt" = []))
)]
pub async fn coffee_machine(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.report_service.coffee_machine(&query, Utc::now()).await?;
    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/reports/consumption-control",
    tag = "Reports",
    params(ReportQuery),
    responses((status = 200, description = "Consumo por usuário contra o limite mensal", body = ConsumptionControlReport)),
    security(("api_jwt" = []))
)]
pub async fn consumption_control(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.report_service.consumption_control(&query, Utc::now()).await?;
    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/reports/predictive",
    tag = "Reports",
    params(ReportQuery),
    responses((status = 200, description = "Previsão de ruptura e sugestão de reposição", body = PredictiveReport)),
    security(("api_jwt" = []))
)]
pub async fn predictive(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.report_service.predictive(&query, Utc::now()).await?;
    Ok((StatusCode::OK, Json(report)))
}

// GET /api/reports/foodstation/export?mode=consolidated|detailed
#[utoipa::path(
    get,
    path = "/api/reports/foodstation/export",
    tag = "Reports",
    params(ReportQuery),
    responses((status = 200, description = "Planilha da FoodStation", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")),
    security(("api_jwt" = []))
)]
pub async fn foodstation_export(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let file = app_state.export_service.foodstation(&query, Utc::now()).await?;
    Ok(xlsx_response(file))
}
