// src/models/stock.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "lowercase")] // Banco
#[serde(rename_all = "lowercase")] // JSON
pub enum TransactionType {
    Entrada,
    Saida,
    Ajuste,
    Devolucao,
}

impl TransactionType {
    /// Tipo padrão a partir do sinal da variação.
    pub fn for_change(change: i64) -> Self {
        if change >= 0 { TransactionType::Entrada } else { TransactionType::Saida }
    }

    /// Entradas e devoluções somam, saídas subtraem, ajustes aceitam ambos.
    pub fn accepts(self, change: i64) -> bool {
        match self {
            TransactionType::Entrada | TransactionType::Devolucao => change > 0,
            TransactionType::Saida => change < 0,
            TransactionType::Ajuste => change != 0,
        }
    }
}

// --- Movimentação (histórico), com nomes resolvidos via JOIN ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockTransaction {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    #[schema(example = 12)]
    pub change: i64,
    pub transaction_type: TransactionType,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub document_origin: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Deltas aplicados aos contadores de um produto numa única instrução.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockDelta {
    pub stock: i64,
    pub total_in: i64,
    pub total_out: i64,
}

impl StockDelta {
    /// Efeito de uma movimentação com variação `change`.
    pub fn for_transaction(change: i64) -> Self {
        Self {
            stock: change,
            total_in: change.max(0),
            total_out: (-change).max(0),
        }
    }

    /// Efeito de desfazer uma movimentação.
    pub fn reverting(change: i64) -> Self {
        let applied = Self::for_transaction(change);
        Self {
            stock: -applied.stock,
            total_in: -applied.total_in,
            total_out: -applied.total_out,
        }
    }

    /// Efeito de consumir `qty` unidades (negativo devolve ao estoque).
    pub fn for_consumption(qty: i64) -> Self {
        Self { stock: -qty, total_in: 0, total_out: qty }
    }
}

fn validate_non_zero(change: i64) -> Result<(), ValidationError> {
    if change == 0 {
        let mut err = ValidationError::new("non_zero");
        err.message = Some("A variação não pode ser zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_type_matches_sign"))]
pub struct CreateStockTransactionPayload {
    pub product_id: Uuid,
    #[validate(custom(function = "validate_non_zero"))]
    #[schema(example = 24)]
    pub change: i64,
    pub transaction_type: Option<TransactionType>,
    #[validate(length(max = 255))]
    pub reason: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    #[validate(length(max = 255))]
    pub document_origin: Option<String>,
}

fn validate_type_matches_sign(p: &CreateStockTransactionPayload) -> Result<(), ValidationError> {
    if let Some(kind) = p.transaction_type {
        if p.change != 0 && !kind.accepts(p.change) {
            let mut err = ValidationError::new("sign");
            err.message = Some(
                "O sinal da variação não corresponde ao tipo da movimentação.".into(),
            );
            return Err(err);
        }
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockTransactionQuery {
    pub product_id: Option<Uuid>,
    pub transaction_type: Option<TransactionType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_sign_rules() {
        assert!(TransactionType::Entrada.accepts(5));
        assert!(!TransactionType::Entrada.accepts(-5));
        assert!(TransactionType::Saida.accepts(-1));
        assert!(!TransactionType::Saida.accepts(1));
        assert!(TransactionType::Ajuste.accepts(-7));
        assert!(TransactionType::Devolucao.accepts(2));
        assert_eq!(TransactionType::for_change(-2), TransactionType::Saida);
    }

    #[test]
    fn deltas_keep_counters_consistent() {
        let applied = StockDelta::for_transaction(-4);
        assert_eq!(applied, StockDelta { stock: -4, total_in: 0, total_out: 4 });
        let reverted = StockDelta::reverting(-4);
        assert_eq!(reverted, StockDelta { stock: 4, total_in: 0, total_out: -4 });
        assert_eq!(StockDelta::reverting(6), StockDelta { stock: -6, total_in: -6, total_out: 0 });
        assert_eq!(StockDelta::for_consumption(3), StockDelta { stock: -3, total_in: 0, total_out: 3 });
    }

    #[test]
    fn zero_change_and_wrong_sign_are_rejected() {
        let p = CreateStockTransactionPayload {
            product_id: Uuid::new_v4(),
            change: 0,
            transaction_type: None,
            reason: None,
            notes: None,
            document_origin: None,
        };
        assert!(p.validate().is_err());

        let p = CreateStockTransactionPayload {
            change: 3,
            transaction_type: Some(TransactionType::Saida),
            ..p
        };
        assert!(p.validate().is_err());
    }
}
