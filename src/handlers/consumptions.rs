// src/handlers/consumptions.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, spreadsheet::XLSX_CONTENT_TYPE},
    config::AppState,
    middleware::auth::{AdminUser, AuthenticatedUser},
    models::consumption::{
        Consumption, ConsumptionQuery, ConsumptionSummary, CreateConsumptionPayload,
        RecentQuery, UpdateConsumptionPayload,
    },
    services::export_service::ExportFile,
};

/// Resposta de download de planilha.
pub(crate) fn xlsx_response(file: ExportFile) -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.bytes,
    )
}

#[utoipa::path(
    get,
    path = "/api/consumptions",
    tag = "Consumptions",
    params(ConsumptionQuery),
    responses((status = 200, description = "Consumos; usuários comuns só veem os próprios", body = Vec<Consumption>)),
    security(("api_jwt" = []))
)]
pub async fn list_consumptions(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ConsumptionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let consumptions = app_state.consumption_service.list(&query, &user).await?;
    Ok((StatusCode::OK, Json(consumptions)))
}

// POST /api/consumptions
#[utoipa::path(
    post,
    path = "/api/consumptions",
    tag = "Consumptions",
    request_body = CreateConsumptionPayload,
    responses(
        (status = 201, description = "Consumo registrado com o preço congelado", body = Consumption),
        (status = 400, description = "Estoque insuficiente ou produto indisponível"),
        (status = 403, description = "Lançamento para outro usuário exige administrador"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_consumption(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateConsumptionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let consumption = app_state.consumption_service.create(&payload, &user).await?;
    Ok((StatusCode::CREATED, Json(consumption)))
}

#[utoipa::path(
    get,
    path = "/api/consumptions/recent",
    tag = "Consumptions",
    params(RecentQuery),
    responses((status = 200, description = "Últimos consumos", body = Vec<Consumption>)),
    security(("api_jwt" = []))
)]
pub async fn recent_consumptions(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<RecentQuery>,
) -> Result<impl IntoResponse, AppError> {
    let consumptions = app_state.consumption_service.recent(query.limit, &user).await?;
    Ok((StatusCode::OK, Json(consumptions)))
}

#[utoipa::path(
    get,
    path = "/api/consumptions/me/summary",
    tag = "Consumptions",
    responses((status = 200, description = "Total do mês e saldo do limite", body = ConsumptionSummary)),
    security(("api_jwt" = []))
)]
pub async fn my_summary(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.consumption_service.summary(&user).await?;
    Ok((StatusCode::OK, Json(summary)))
}

#[utoipa::path(
    put,
    path = "/api/consumptions/{id}",
    tag = "Consumptions",
    params(("id" = Uuid, Path, description = "ID do consumo")),
    request_body = UpdateConsumptionPayload,
    responses(
        (status = 200, description = "Quantidade corrigida", body = Consumption),
        (status = 400, description = "Estoque insuficiente"),
        (status = 404, description = "Consumo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_consumption(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateConsumptionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let consumption = app_state.consumption_service.update(id, payload.qty).await?;
    Ok((StatusCode::OK, Json(consumption)))
}

#[utoipa::path(
    delete,
    path = "/api/consumptions/{id}",
    tag = "Consumptions",
    params(("id" = Uuid, Path, description = "ID do consumo")),
    responses(
        (status = 204, description = "Consumo excluído e estoque devolvido"),
        (status = 404, description = "Consumo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_consumption(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.consumption_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/consumptions/export -> .xlsx
#[utoipa::path(
    get,
    path = "/api/consumptions/export",
    tag = "Consumptions",
    params(ConsumptionQuery),
    responses((status = 200, description = "Planilha com os consumos filtrados", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")),
    security(("api_jwt" = []))
)]
pub async fn export_consumptions(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ConsumptionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let file = app_state.export_service.consumptions(&query, Utc::now()).await?;
    Ok(xlsx_response(file))
}
