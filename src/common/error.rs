use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("Estoque insuficiente: disponível {available}, solicitado {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    // Violação de chave estrangeira ao excluir (ex: produto com consumos)
    #[error("{0}")]
    ReferencedResource(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} não encontrado."))
    }

    /// Erro de validação de um único campo, no mesmo formato do `validator`.
    pub fn field(field: &'static str, code: &'static str, message: &'static str) -> Self {
        let mut err = validator::ValidationError::new(code);
        err.message = Some(message.into());
        let mut errors = validator::ValidationErrors::new();
        errors.add(field, err);
        AppError::ValidationError(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::InsufficientStock { .. }
            | AppError::ReferencedResource(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Traduz violações de constraint do SQLite em erros de domínio.
/// `unique` e `referenced` são as mensagens para cada caso.
pub fn map_constraint_error(e: sqlx::Error, unique: &str, referenced: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict(unique.to_string());
        }
        if db_err.is_foreign_key_violation() || is_restrict_violation(db_err.code().as_deref()) {
            return AppError::ReferencedResource(referenced.to_string());
        }
    }
    AppError::DatabaseError(e)
}

// `ON DELETE RESTRICT` chega como SQLITE_CONSTRAINT_TRIGGER (1811), que o
// sqlx não classifica como chave estrangeira. 787 é SQLITE_CONSTRAINT_FOREIGNKEY.
fn is_restrict_violation(code: Option<&str>) -> bool {
    matches!(code, Some("787" | "1811"))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "message": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::InvalidCredentials => "Matrícula ou senha inválidos.".to_string(),
            AppError::InvalidToken => "Token de autenticação inválido ou ausente.".to_string(),
            AppError::Forbidden => "Acesso restrito a administradores.".to_string(),
            e @ (AppError::BadRequest(_)
            | AppError::InsufficientStock { .. }
            | AppError::ReferencedResource(_)
            | AppError::NotFound(_)
            | AppError::Conflict(_)) => e.to_string(),

            // Todos os outros erros viram 500. O detalhe vai só para o log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                "Ocorreu um erro inesperado.".to_string()
            }
        };

        let body = Json(json!({ "message": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InsufficientStock { available: 1, requested: 2 }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("Produto").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("dup".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::ReferencedResource("em uso".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn restrict_codes_count_as_references() {
        assert!(is_restrict_violation(Some("1811")));
        assert!(is_restrict_violation(Some("787")));
        assert!(!is_restrict_violation(Some("2067")));
        assert!(!is_restrict_violation(None));
    }

    #[test]
    fn insufficient_stock_message_names_quantities() {
        let msg = AppError::InsufficientStock { available: 3, requested: 5 }.to_string();
        assert!(msg.contains('3') && msg.contains('5'));
    }

    #[test]
    fn field_error_carries_message() {
        let AppError::ValidationError(errors) = AppError::field("password", "required", "Senha obrigatória.")
        else {
            panic!("esperado ValidationError");
        };
        let field = errors.field_errors();
        let msgs = field.get("password").expect("campo password");
        assert_eq!(msgs[0].message.as_deref(), Some("Senha obrigatória."));
    }
}
