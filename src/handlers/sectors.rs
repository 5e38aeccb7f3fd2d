// src/handlers/sectors.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AdminUser, AuthenticatedUser},
    models::sector::{Sector, SectorPayload},
};

#[utoipa::path(
    get,
    path = "/api/sectors",
    tag = "Sectors",
    responses((status = 200, description = "Lista de setores", body = Vec<Sector>)),
    security(("api_jwt" = []))
)]
pub async fn list_sectors(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let sectors = app_state.sector_service.list().await?;
    Ok((StatusCode::OK, Json(sectors)))
}

#[utoipa::path(
    post,
    path = "/api/sectors",
    tag = "Sectors",
    request_body = SectorPayload,
    responses(
        (status = 201, description = "Setor criado", body = Sector),
        (status = 409, description = "Nome já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sector(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<SectorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let sector = app_state.sector_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(sector)))
}

#[utoipa::path(
    put,
    path = "/api/sectors/{id}",
    tag = "Sectors",
    params(("id" = Uuid, Path, description = "ID do setor")),
    request_body = SectorPayload,
    responses(
        (status = 200, description = "Setor atualizado", body = Sector),
        (status = 404, description = "Setor não encontrado"),
        (status = 409, description = "Nome já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_sector(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SectorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let sector = app_state.sector_service.update(id, &payload).await?;
    Ok((StatusCode::OK, Json(sector)))
}

#[utoipa::path(
    delete,
    path = "/api/sectors/{id}",
    tag = "Sectors",
    params(("id" = Uuid, Path, description = "ID do setor")),
    responses(
        (status = 204, description = "Setor excluído; os produtos ficam sem setor"),
        (status = 404, description = "Setor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_sector(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.sector_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
