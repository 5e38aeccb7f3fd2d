// src/services/consumption_service.rs

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    common::{dates::DateRange, error::AppError},
    db::{
        self, ConsumptionRepository, ProductRepository, UserRepository,
        consumption_repo::ConsumptionFilter,
    },
    models::{
        consumption::{
            Consumption, ConsumptionQuery, ConsumptionSummary, CreateConsumptionPayload,
        },
        stock::StockDelta,
        user::User,
    },
    services::stock_service::StockService,
};

pub const DEFAULT_RECENT: i64 = 10;
pub const MAX_RECENT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 5000;

#[derive(Clone)]
pub struct ConsumptionService {
    pool: SqlitePool,
    consumption_repo: ConsumptionRepository,
    product_repo: ProductRepository,
    user_repo: UserRepository,
    stock_service: StockService,
}

impl ConsumptionService {
    pub fn new(
        pool: SqlitePool,
        consumption_repo: ConsumptionRepository,
        product_repo: ProductRepository,
        user_repo: UserRepository,
        stock_service: StockService,
    ) -> Self {
        Self { pool, consumption_repo, product_repo, user_repo, stock_service }
    }

    /// Lança um consumo. O preço unitário atual do produto fica congelado na linha.
    pub async fn create(
        &self,
        payload: &CreateConsumptionPayload,
        actor: &User,
    ) -> Result<Consumption, AppError> {
        let user_id = match payload.user_id {
            Some(id) if id != actor.id => {
                if !actor.is_admin() {
                    return Err(AppError::Forbidden);
                }
                self.user_repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Usuário"))?
                    .id
            }
            _ => actor.id,
        };

        let mut tx = db::begin_write(&self.pool).await?;
        let product = self
            .product_repo
            .find_by_id(&mut *tx, payload.product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Produto"))?;

        if !actor.is_admin() && !product.is_available() {
            return Err(AppError::BadRequest(
                "Este produto não está disponível na FoodStation.".into(),
            ));
        }

        self.stock_service
            .apply(&mut tx, product.id, StockDelta::for_consumption(payload.qty), None)
            .await?;
        let id = self
            .consumption_repo
            .insert(&mut *tx, user_id, product.id, payload.qty, product.unit_price, Utc::now())
            .await?;
        let created = self
            .consumption_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Consumo"))?;
        tx.commit().await?;

        tracing::info!(
            "☕ Consumo de {}x {} por {}",
            payload.qty,
            product.name,
            created.matricula.as_deref().unwrap_or("?")
        );
        Ok(created)
    }

    /// Ajusta o estoque pela diferença e recalcula o total com o preço congelado.
    pub async fn update(&self, id: Uuid, qty: i64) -> Result<Consumption, AppError> {
        let mut tx = db::begin_write(&self.pool).await?;
        let current = self
            .consumption_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Consumo"))?;

        let diff = qty - current.qty;
        if diff != 0 {
            self.stock_service
                .apply(&mut tx, current.product_id, StockDelta::for_consumption(diff), None)
                .await?;
            self.consumption_repo.update_qty(&mut *tx, id, qty).await?;
        }

        let updated = self
            .consumption_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Consumo"))?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Devolve a quantidade ao estoque e desconta do total de saídas.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = db::begin_write(&self.pool).await?;
        let current = self
            .consumption_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Consumo"))?;

        self.stock_service
            .apply(&mut tx, current.product_id, StockDelta::for_consumption(-current.qty), None)
            .await?;
        self.consumption_repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("Consumo {} excluído, {} unidades devolvidas", id, current.qty);
        Ok(())
    }

    /// Administradores veem tudo; os demais só os próprios lançamentos.
    pub async fn list(&self, query: &ConsumptionQuery, actor: &User) -> Result<Vec<Consumption>, AppError> {
        let range = DateRange::from_days(query.start_date, query.end_date)?;
        let filter = ConsumptionFilter {
            user_id: if actor.is_admin() { query.user_id } else { Some(actor.id) },
            product_id: query.product_id,
            sector_id: query.sector_id,
            range,
        };
        let limit = query.limit.map(|l| l.clamp(1, MAX_LIST_LIMIT));
        self.consumption_repo.list(&filter, limit).await
    }

    /// Todos os consumos do filtro, sem limite (exportação).
    pub async fn list_all(&self, filter: &ConsumptionFilter) -> Result<Vec<Consumption>, AppError> {
        self.consumption_repo.list(filter, None).await
    }

    pub async fn recent(&self, limit: Option<i64>, actor: &User) -> Result<Vec<Consumption>, AppError> {
        let filter = ConsumptionFilter {
            user_id: (!actor.is_admin()).then_some(actor.id),
            ..Default::default()
        };
        let limit = limit.unwrap_or(DEFAULT_RECENT).clamp(1, MAX_RECENT);
        self.consumption_repo.list(&filter, Some(limit)).await
    }

    /// Total do mês corrente contra o limite mensal do usuário.
    pub async fn summary(&self, user: &User) -> Result<ConsumptionSummary, AppError> {
        let totals = self
            .consumption_repo
            .user_totals(user.id, DateRange::current_month(Utc::now()))
            .await?;
        let limit = user.active_limit();
        Ok(ConsumptionSummary {
            month_count: totals.count,
            month_qty: totals.qty,
            month_total: totals.total,
            monthly_limit: user.monthly_limit,
            limit_enabled: user.limit_enabled,
            remaining: limit.map(|l| (l - totals.total).max(0.0)),
        })
    }
}
