// src/models/product.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
pub enum ProductStatus {
    #[default]
    Ativo,
    Inativo,
}

// --- Produto (com o nome do setor resolvido via JOIN) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "Cápsula de café")]
    pub name: String,
    pub sector_id: Option<Uuid>,
    pub sector_name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    #[schema(example = "un")]
    pub unit: String,
    #[schema(example = 2.5)]
    pub unit_price: f64,
    pub sale_price: Option<f64>,
    pub stock_quantity: i64,
    pub min_quantity: i64,
    pub max_quantity: Option<i64>,
    pub total_in: i64,
    pub total_out: i64,
    pub photo_path: Option<String>,
    pub low_stock_threshold: i64,
    pub supplier: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub last_restock_at: Option<DateTime<Utc>>,
    pub status: ProductStatus,
    pub visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.low_stock_threshold
    }

    /// Disponível no catálogo da FoodStation.
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Ativo && self.visible
    }

    pub fn stock_value(&self) -> f64 {
        self.stock_quantity as f64 * self.unit_price
    }
}

/// Dados já validados para inserir um produto (cadastro ou importação).
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub sector_id: Option<Uuid>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub unit: String,
    pub unit_price: f64,
    pub sale_price: Option<f64>,
    pub stock_quantity: i64,
    pub min_quantity: i64,
    pub max_quantity: Option<i64>,
    pub low_stock_threshold: i64,
    pub supplier: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub status: ProductStatus,
    pub visible: bool,
}

impl NewProduct {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sector_id: None,
            sku: None,
            category: None,
            unit: "un".into(),
            unit_price: 0.0,
            sale_price: None,
            stock_quantity: 0,
            min_quantity: 0,
            max_quantity: None,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            supplier: None,
            expiration_date: None,
            status: ProductStatus::Ativo,
            visible: true,
        }
    }
}

fn validate_not_blank(val: &str) -> Result<(), ValidationError> {
    if val.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("O nome é obrigatório.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_quantity_bounds"))]
pub struct CreateProductPayload {
    #[validate(length(max = 200), custom(function = "validate_not_blank"))]
    pub name: String,
    pub sector_id: Option<Uuid>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,

    #[validate(range(min = 0.0, message = "O preço não pode ser negativo."))]
    pub unit_price: f64,

    #[validate(range(min = 0.0, message = "O preço de venda não pode ser negativo."))]
    pub sale_price: Option<f64>,

    // Estoque inicial: vira uma movimentação de entrada.
    #[serde(default)]
    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub stock_quantity: i64,

    #[serde(default)]
    #[validate(range(min = 0, message = "A quantidade mínima não pode ser negativa."))]
    pub min_quantity: i64,

    #[validate(range(min = 0, message = "A quantidade máxima não pode ser negativa."))]
    pub max_quantity: Option<i64>,

    #[validate(range(min = 0, message = "O limite de estoque baixo não pode ser negativo."))]
    pub low_stock_threshold: Option<i64>,

    pub supplier: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub status: Option<ProductStatus>,
    pub visible: Option<bool>,
}

fn validate_quantity_bounds(p: &CreateProductPayload) -> Result<(), ValidationError> {
    check_bounds(Some(p.min_quantity), p.max_quantity)
}

fn check_bounds(min: Option<i64>, max: Option<i64>) -> Result<(), ValidationError> {
    if let (Some(min), Some(max)) = (min, max) {
        if max < min {
            let mut err = ValidationError::new("bounds");
            err.message = Some("A quantidade máxima deve ser maior ou igual à mínima.".into());
            return Err(err);
        }
    }
    Ok(())
}

impl From<CreateProductPayload> for NewProduct {
    fn from(p: CreateProductPayload) -> Self {
        Self {
            name: p.name.trim().to_string(),
            sector_id: p.sector_id,
            sku: p.sku.filter(|s| !s.trim().is_empty()),
            category: p.category.filter(|s| !s.trim().is_empty()),
            unit: p.unit.filter(|s| !s.trim().is_empty()).unwrap_or_else(|| "un".into()),
            unit_price: p.unit_price,
            sale_price: p.sale_price,
            stock_quantity: p.stock_quantity,
            min_quantity: p.min_quantity,
            max_quantity: p.max_quantity,
            low_stock_threshold: p.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
            supplier: p.supplier.filter(|s| !s.trim().is_empty()),
            expiration_date: p.expiration_date,
            status: p.status.unwrap_or_default(),
            visible: p.visible.unwrap_or(true),
        }
    }
}

/// Edição parcial. O estoque não é editável aqui: só muda por movimentação
/// ou consumo.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_bounds"))]
pub struct UpdateProductPayload {
    #[validate(length(max = 200), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    pub sector_id: Option<Uuid>,
    // true remove o vínculo com o setor
    #[serde(default)]
    pub clear_sector: bool,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    #[validate(range(min = 0.0, message = "O preço não pode ser negativo."))]
    pub unit_price: Option<f64>,
    #[validate(range(min = 0.0, message = "O preço de venda não pode ser negativo."))]
    pub sale_price: Option<f64>,
    #[validate(range(min = 0))]
    pub min_quantity: Option<i64>,
    #[validate(range(min = 0))]
    pub max_quantity: Option<i64>,
    #[validate(range(min = 0))]
    pub low_stock_threshold: Option<i64>,
    pub supplier: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub status: Option<ProductStatus>,
    pub visible: Option<bool>,
}

fn validate_update_bounds(p: &UpdateProductPayload) -> Result<(), ValidationError> {
    check_bounds(p.min_quantity, p.max_quantity)
}

impl UpdateProductPayload {
    /// Aplica a edição sobre o estado atual, gerando a linha completa.
    pub fn apply_to(self, current: &Product) -> NewProduct {
        NewProduct {
            name: self.name.map(|n| n.trim().to_string()).unwrap_or_else(|| current.name.clone()),
            sector_id: if self.clear_sector { None } else { self.sector_id.or(current.sector_id) },
            sku: self.sku.or_else(|| current.sku.clone()),
            category: self.category.or_else(|| current.category.clone()),
            unit: self.unit.unwrap_or_else(|| current.unit.clone()),
            unit_price: self.unit_price.unwrap_or(current.unit_price),
            sale_price: self.sale_price.or(current.sale_price),
            stock_quantity: current.stock_quantity,
            min_quantity: self.min_quantity.unwrap_or(current.min_quantity),
            max_quantity: self.max_quantity.or(current.max_quantity),
            low_stock_threshold: self.low_stock_threshold.unwrap_or(current.low_stock_threshold),
            supplier: self.supplier.or_else(|| current.supplier.clone()),
            expiration_date: self.expiration_date.or(current.expiration_date),
            status: self.status.unwrap_or(current.status),
            visible: self.visible.unwrap_or(current.visible),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub sector_id: Option<Uuid>,
    pub status: Option<ProductStatus>,
    /// Busca por nome, SKU ou categoria
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub imported: usize,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CreateProductPayload {
        serde_json::from_value(serde_json::json!({
            "name": "  Café  ",
            "unitPrice": 2.5,
            "stockQuantity": 20
        }))
        .unwrap()
    }

    #[test]
    fn defaults_are_applied_on_create() {
        let p = payload();
        assert!(p.validate().is_ok());
        let new: NewProduct = p.into();
        assert_eq!(new.name, "Café");
        assert_eq!(new.unit, "un");
        assert_eq!(new.low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);
        assert_eq!(new.status, ProductStatus::Ativo);
        assert!(new.visible);
    }

    #[test]
    fn blank_name_and_bad_bounds_fail_validation() {
        let mut p = payload();
        p.name = "   ".into();
        assert!(p.validate().is_err());

        let mut p = payload();
        p.min_quantity = 10;
        p.max_quantity = Some(5);
        assert!(p.validate().is_err());
    }
}
