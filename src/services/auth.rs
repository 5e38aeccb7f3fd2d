// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    common::error::AppError,
    config::AdminSeed,
    db::{UserRepository, user_repo::UserRecord},
    models::{
        auth::Claims,
        user::{Role, User},
    },
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    ttl_hours: i64,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, ttl_hours: i64) -> Self {
        Self { user_repo, jwt_secret, ttl_hours }
    }

    /// Login por matrícula. Administradores precisam de senha; usuários comuns
    /// entram só com a matrícula.
    pub async fn login(&self, matricula: &str, password: Option<&str>) -> Result<(String, User), AppError> {
        let user = self
            .user_repo
            .find_by_matricula(matricula.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if user.is_admin() {
            let (Some(password), Some(password_hash)) = (password, user.password_hash.clone())
            else {
                return Err(AppError::InvalidCredentials);
            };

            let password_clone = password.to_owned();
            // Executa a verificação em um thread separado
            let is_password_valid = tokio::task::spawn_blocking(move || {
                verify(&password_clone, &password_hash)
            })
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

            if !is_password_valid {
                return Err(AppError::InvalidCredentials);
            }
        }

        tracing::info!("🔑 Login de {} ({:?})", user.matricula, user.role);
        let token = self.create_token(&user)?;
        Ok((token, user))
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        // O usuário pode ter sido excluído depois da emissão do token.
        self.user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.ttl_hours);

        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    /// Cria o primeiro administrador se ainda não houver nenhum.
    pub async fn seed_admin(&self, seed: &AdminSeed) -> Result<(), AppError> {
        if self.user_repo.count_admins().await? > 0 {
            return Ok(());
        }

        let password_hash = hash_password(&seed.password).await?;
        let admin = self
            .user_repo
            .create(&UserRecord {
                full_name: seed.full_name.clone(),
                matricula: seed.matricula.clone(),
                password_hash: Some(password_hash),
                role: Role::Admin,
                monthly_limit: None,
                limit_enabled: false,
            })
            .await?;

        tracing::info!("👤 Administrador inicial criado (matrícula {})", admin.matricula);
        Ok(())
    }
}

/// bcrypt é caro: roda fora do executor async.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}
