use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    common::error::{AppError, map_constraint_error},
    models::user::{Role, User},
};

const DUPLICATE_MATRICULA: &str = "Esta matrícula já está em uso.";
const USER_IN_USE: &str =
    "Não é possível excluir o usuário: existem consumos registrados em seu nome.";

/// Campos persistidos de um usuário (senha já em hash).
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub full_name: String,
    pub matricula: String,
    pub password_hash: Option<String>,
    pub role: Role,
    pub monthly_limit: Option<f64>,
    pub limit_enabled: bool,
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // Busca um usuário pela matrícula
    pub async fn find_by_matricula(&self, matricula: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE matricula = $1")
            .bind(matricula)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY full_name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_admins(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // Cria um novo usuário no banco de dados
    pub async fn create(&self, record: &UserRecord) -> Result<User, AppError> {
        let now = Utc::now();
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, full_name, matricula, password_hash, role, monthly_limit, limit_enabled, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.full_name)
        .bind(&record.matricula)
        .bind(&record.password_hash)
        .bind(record.role)
        .bind(record.monthly_limit)
        .bind(record.limit_enabled)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        // Converte erro de violação de chave única em um erro mais amigável
        .map_err(|e| map_constraint_error(e, DUPLICATE_MATRICULA, USER_IN_USE))
    }

    pub async fn update(&self, id: Uuid, record: &UserRecord) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                full_name = $2,
                matricula = $3,
                password_hash = $4,
                role = $5,
                monthly_limit = $6,
                limit_enabled = $7,
                updated_at = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&record.full_name)
        .bind(&record.matricula)
        .bind(&record.password_hash)
        .bind(record.role)
        .bind(record.monthly_limit)
        .bind(record.limit_enabled)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, DUPLICATE_MATRICULA, USER_IN_USE))
    }

    /// Retorna `false` se o usuário não existia.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, DUPLICATE_MATRICULA, USER_IN_USE))?;
        Ok(result.rows_affected() > 0)
    }
}

impl From<&User> for UserRecord {
    fn from(u: &User) -> Self {
        Self {
            full_name: u.full_name.clone(),
            matricula: u.matricula.clone(),
            password_hash: u.password_hash.clone(),
            role: u.role,
            monthly_limit: u.monthly_limit,
            limit_enabled: u.limit_enabled,
        }
    }
}
