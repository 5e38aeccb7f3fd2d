// src/services/product_service.rs

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, storage::UploadStore},
    db::{self, ProductRepository, stock_repo::NewTransaction},
    models::{
        product::{NewProduct, Product, ProductQuery, UpdateProductPayload},
        stock::TransactionType,
    },
    services::stock_service::StockService,
};

#[derive(Clone)]
pub struct ProductService {
    pool: SqlitePool,
    product_repo: ProductRepository,
    stock_service: StockService,
    uploads: UploadStore,
}

impl ProductService {
    pub fn new(
        pool: SqlitePool,
        product_repo: ProductRepository,
        stock_service: StockService,
        uploads: UploadStore,
    ) -> Self {
        Self { pool, product_repo, stock_service, uploads }
    }

    /// Administradores veem tudo com filtros; os demais só o catálogo.
    pub async fn list(&self, query: &ProductQuery, is_admin: bool) -> Result<Vec<Product>, AppError> {
        if is_admin {
            self.product_repo.list(query).await
        } else {
            self.product_repo.list_available().await
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, AppError> {
        self.product_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Produto"))
    }

    /// Produto visível para quem não é administrador.
    pub async fn get_for(&self, id: Uuid, is_admin: bool) -> Result<Product, AppError> {
        let product = self.get(id).await?;
        if !is_admin && !product.is_available() {
            return Err(AppError::not_found("Produto"));
        }
        Ok(product)
    }

    pub async fn low_stock(&self) -> Result<Vec<Product>, AppError> {
        self.product_repo.list_low_stock().await
    }

    pub async fn create(&self, new: NewProduct, user_id: Option<Uuid>) -> Result<Product, AppError> {
        let created = self.create_many(&[new], user_id).await?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| AppError::InternalServerError(anyhow::anyhow!("Produto não criado")))
    }

    /// Insere todos os produtos numa única transação. O estoque inicial de
    /// cada um vira uma movimentação de entrada.
    pub async fn create_many(
        &self,
        rows: &[NewProduct],
        user_id: Option<Uuid>,
    ) -> Result<Vec<Product>, AppError> {
        let mut tx = db::begin_write(&self.pool).await?;
        let mut ids = Vec::with_capacity(rows.len());

        for new in rows {
            let id = self.product_repo.create(&mut *tx, new).await?;
            if new.stock_quantity > 0 {
                self.stock_service
                    .record(
                        &mut tx,
                        NewTransaction {
                            product_id: id,
                            user_id,
                            change: new.stock_quantity,
                            transaction_type: TransactionType::Entrada,
                            reason: Some("Estoque inicial"),
                            notes: None,
                            document_origin: None,
                        },
                    )
                    .await?;
            }
            ids.push(id);
        }

        let mut created = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(product) = self.product_repo.find_by_id(&mut *tx, id).await? {
                created.push(product);
            }
        }
        tx.commit().await?;
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateProductPayload) -> Result<Product, AppError> {
        let current = self.get(id).await?;
        let data = payload.apply_to(&current);
        if let (Some(max), min) = (data.max_quantity, data.min_quantity) {
            if max < min {
                return Err(AppError::field(
                    "maxQuantity",
                    "bounds",
                    "A quantidade máxima deve ser maior ou igual à mínima.",
                ));
            }
        }

        if !self.product_repo.update(id, &data).await? {
            return Err(AppError::not_found("Produto"));
        }
        self.get(id).await
    }

    /// Falha com 400 se houver consumos; as movimentações vão junto (cascade).
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let product = self.get(id).await?;
        if !self.product_repo.delete(id).await? {
            return Err(AppError::not_found("Produto"));
        }
        if let Some(photo) = product.photo_path.as_deref() {
            self.uploads.remove_best_effort(photo).await;
        }
        tracing::info!("Produto {} ({}) excluído", product.name, id);
        Ok(())
    }

    pub async fn set_photo(
        &self,
        id: Uuid,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<Product, AppError> {
        let product = self.get(id).await?;
        let stored = self.uploads.save("product", original_name, bytes).await?;

        if let Err(e) = self.product_repo.set_photo(id, Some(&stored.public_path)).await {
            // Não deixa arquivo órfão se o registro falhar.
            crate::common::storage::remove_file_best_effort(&stored.disk_path).await;
            return Err(e);
        }
        if let Some(old) = product.photo_path.as_deref() {
            self.uploads.remove_best_effort(old).await;
        }
        self.get(id).await
    }

    pub async fn remove_photo(&self, id: Uuid) -> Result<Product, AppError> {
        let product = self.get(id).await?;
        if let Some(old) = product.photo_path.as_deref() {
            self.product_repo.set_photo(id, None).await?;
            self.uploads.remove_best_effort(old).await;
        }
        self.get(id).await
    }
}
