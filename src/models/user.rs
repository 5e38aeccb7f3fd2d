// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "Maria da Silva")]
    pub full_name: String,
    #[schema(example = "100234")]
    pub matricula: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: Option<String>,

    pub role: Role,
    #[schema(example = 150.0)]
    pub monthly_limit: Option<f64>,
    pub limit_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Limite mensal efetivo (só conta se estiver habilitado).
    pub fn active_limit(&self) -> Option<f64> {
        if self.limit_enabled { self.monthly_limit } else { None }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 1, max = 150, message = "O nome é obrigatório."))]
    pub full_name: String,

    #[validate(length(min = 1, max = 50, message = "A matrícula é obrigatória."))]
    pub matricula: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,

    #[serde(default = "default_role")]
    pub role: Role,

    #[validate(range(min = 0.0, message = "O limite mensal não pode ser negativo."))]
    pub monthly_limit: Option<f64>,

    #[serde(default)]
    pub limit_enabled: bool,
}

fn default_role() -> Role {
    Role::User
}

/// Edição parcial: campos ausentes ficam como estão.
/// `monthlyLimit: null` remove o limite.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_limit"))]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, max = 150, message = "O nome não pode ficar vazio."))]
    pub full_name: Option<String>,

    #[validate(length(min = 1, max = 50, message = "A matrícula não pode ficar vazia."))]
    pub matricula: Option<String>,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,

    pub role: Option<Role>,

    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<f64>)]
    pub monthly_limit: Option<Option<f64>>,

    pub limit_enabled: Option<bool>,
}

// Campo presente vira `Some`, mesmo quando vem `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

fn validate_update_limit(payload: &UpdateUserPayload) -> Result<(), ValidationError> {
    if matches!(payload.monthly_limit, Some(Some(limit)) if limit < 0.0) {
        let mut err = ValidationError::new("range");
        err.message = Some("O limite mensal não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_limit_distinguishes_absent_from_null() {
        let absent: UpdateUserPayload = serde_json::from_str(r#"{"fullName":"Ana"}"#).unwrap();
        assert_eq!(absent.monthly_limit, None);

        let cleared: UpdateUserPayload = serde_json::from_str(r#"{"monthlyLimit":null}"#).unwrap();
        assert_eq!(cleared.monthly_limit, Some(None));

        let set: UpdateUserPayload = serde_json::from_str(r#"{"monthlyLimit":80.5}"#).unwrap();
        assert_eq!(set.monthly_limit, Some(Some(80.5)));
    }

    #[test]
    fn negative_limit_is_rejected() {
        let payload: UpdateUserPayload = serde_json::from_str(r#"{"monthlyLimit":-1}"#).unwrap();
        assert!(payload.validate().is_err());
    }
}
