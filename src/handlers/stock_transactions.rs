// src/handlers/stock_transactions.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AdminUser,
    models::stock::{CreateStockTransactionPayload, StockTransaction, StockTransactionQuery},
};

#[utoipa::path(
    get,
    path = "/api/stock-transactions",
    tag = "Stock",
    params(StockTransactionQuery),
    responses((status = 200, description = "Histórico de movimentações, mais recentes primeiro", body = Vec<StockTransaction>)),
    security(("api_jwt" = []))
)]
pub async fn list_transactions(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<StockTransactionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = app_state.stock_service.list(&query).await?;
    Ok((StatusCode::OK, Json(transactions)))
}

// POST /api/stock-transactions
#[utoipa::path(
    post,
    path = "/api/stock-transactions",
    tag = "Stock",
    request_body = CreateStockTransactionPayload,
    responses(
        (status = 201, description = "Movimentação registrada", body = StockTransaction),
        (status = 400, description = "Estoque insuficiente ou dados inválidos"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_transaction(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<CreateStockTransactionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let transaction = app_state.stock_service.post(&payload, admin.id).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

#[utoipa::path(
    delete,
    path = "/api/stock-transactions/{id}",
    tag = "Stock",
    params(("id" = Uuid, Path, description = "ID da movimentação")),
    responses(
        (status = 204, description = "Movimentação desfeita e removida"),
        (status = 400, description = "Desfazer deixaria o estoque negativo"),
        (status = 404, description = "Movimentação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_transaction(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.stock_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
