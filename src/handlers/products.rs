// src/handlers/products.rs

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, storage::sanitized_extension},
    config::AppState,
    middleware::auth::{AdminUser, AuthenticatedUser},
    models::product::{
        CreateProductPayload, ImportResult, Product, ProductQuery, UpdateProductPayload,
    },
};

const PHOTO_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];
const SHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xls", "xlsm", "ods"];

/// Arquivo enviado num campo multipart.
struct UploadedFile {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

/// Lê o primeiro campo com o nome esperado.
async fn read_file_field(multipart: &mut Multipart, field_name: &str) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Upload inválido: {e}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Upload inválido: {e}")))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("O arquivo enviado está vazio.".into()));
        }
        return Ok(UploadedFile { file_name, bytes: bytes.to_vec() });
    }
    Err(AppError::BadRequest(format!("Campo '{field_name}' não enviado.")))
}

fn require_extension(file: &UploadedFile, allowed: &[&str]) -> Result<(), AppError> {
    let ext = file.file_name.as_deref().and_then(sanitized_extension);
    match ext {
        Some(ext) if allowed.contains(&ext.as_str()) => Ok(()),
        _ => Err(AppError::BadRequest(format!(
            "Tipo de arquivo não suportado. Use: {}.",
            allowed.join(", ")
        ))),
    }
}

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Administradores veem tudo; usuários só o catálogo da FoodStation", body = Vec<Product>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state.product_service.list(&query, user.is_admin()).await?;
    Ok((StatusCode::OK, Json(products)))
}

#[utoipa::path(
    get,
    path = "/api/products/low-stock",
    tag = "Products",
    responses((status = 200, description = "Produtos no limite ou abaixo dele", body = Vec<Product>)),
    security(("api_jwt" = []))
)]
pub async fn low_stock(
    State(app_state): State<AppState>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state.product_service.low_stock().await?;
    Ok((StatusCode::OK, Json(products)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.product_service.get_for(id, user.is_admin()).await?;
    Ok((StatusCode::OK, Json(product)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado; estoque inicial registrado como entrada", body = Product),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let product = app_state
        .product_service
        .create(payload.into(), Some(admin.id))
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let product = app_state.product_service.update(id, payload).await?;
    Ok((StatusCode::OK, Json(product)))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 204, description = "Produto excluído"),
        (status = 400, description = "Produto possui consumos registrados"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.product_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/products/{id}/photo (multipart, campo "photo")
#[utoipa::path(
    post,
    path = "/api/products/{id}/photo",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body(content_type = "multipart/form-data", description = "Campo 'photo' com a imagem"),
    responses(
        (status = 200, description = "Foto atualizada", body = Product),
        (status = 400, description = "Arquivo ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_photo(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let file = read_file_field(&mut multipart, "photo").await?;
    require_extension(&file, &PHOTO_EXTENSIONS)?;
    let product = app_state
        .product_service
        .set_photo(id, file.file_name.as_deref(), &file.bytes)
        .await?;
    Ok((StatusCode::OK, Json(product)))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}/photo",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses((status = 200, description = "Foto removida", body = Product)),
    security(("api_jwt" = []))
)]
pub async fn delete_photo(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.product_service.remove_photo(id).await?;
    Ok((StatusCode::OK, Json(product)))
}

// POST /api/products/bulk-import (multipart, campo "file")
#[utoipa::path(
    post,
    path = "/api/products/bulk-import",
    tag = "Products",
    request_body(content_type = "multipart/form-data", description = "Campo 'file' com a planilha (xlsx, xls, ods)"),
    responses(
        (status = 200, description = "Resultado da importação com erros por linha", body = ImportResult),
        (status = 400, description = "Arquivo ausente ou ilegível")
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_import(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let file = read_file_field(&mut multipart, "file").await?;
    require_extension(&file, &SHEET_EXTENSIONS)?;
    let result = app_state
        .import_service
        .import_file(file.file_name.as_deref(), &file.bytes, Some(admin.id))
        .await?;
    Ok((StatusCode::OK, Json(result)))
}
