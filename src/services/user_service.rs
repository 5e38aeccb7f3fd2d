// src/services/user_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{UserRepository, user_repo::UserRecord},
    models::user::{CreateUserPayload, Role, UpdateUserPayload, User},
    services::auth::hash_password,
};

const ADMIN_NEEDS_PASSWORD: &str = "Administradores precisam de uma senha.";

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    pub fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Usuário"))
    }

    pub async fn create(&self, payload: CreateUserPayload) -> Result<User, AppError> {
        let password_hash = match payload.password.as_deref() {
            Some(p) => Some(hash_password(p).await?),
            None if payload.role == Role::Admin => {
                return Err(AppError::field("password", "required", ADMIN_NEEDS_PASSWORD));
            }
            None => None,
        };

        let user = self
            .user_repo
            .create(&UserRecord {
                full_name: payload.full_name.trim().to_string(),
                matricula: payload.matricula.trim().to_string(),
                password_hash,
                role: payload.role,
                monthly_limit: payload.monthly_limit,
                limit_enabled: payload.limit_enabled,
            })
            .await?;

        tracing::info!("Usuário {} criado", user.matricula);
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateUserPayload) -> Result<User, AppError> {
        let current = self.get(id).await?;
        let mut record = UserRecord::from(&current);

        if let Some(name) = payload.full_name {
            record.full_name = name.trim().to_string();
        }
        if let Some(matricula) = payload.matricula {
            record.matricula = matricula.trim().to_string();
        }
        if let Some(role) = payload.role {
            record.role = role;
        }
        if let Some(limit) = payload.monthly_limit {
            record.monthly_limit = limit;
        }
        if let Some(enabled) = payload.limit_enabled {
            record.limit_enabled = enabled;
        }
        if let Some(password) = payload.password.as_deref() {
            record.password_hash = Some(hash_password(password).await?);
        }

        // Promover a admin exige senha (nova ou já existente).
        if record.role == Role::Admin && record.password_hash.is_none() {
            return Err(AppError::field("password", "required", ADMIN_NEEDS_PASSWORD));
        }

        self.user_repo
            .update(id, &record)
            .await?
            .ok_or_else(|| AppError::not_found("Usuário"))
    }

    pub async fn delete(&self, id: Uuid, current_user: &User) -> Result<(), AppError> {
        if id == current_user.id {
            return Err(AppError::BadRequest(
                "Você não pode excluir o próprio usuário.".into(),
            ));
        }
        if !self.user_repo.delete(id).await? {
            return Err(AppError::not_found("Usuário"));
        }
        tracing::info!("Usuário {} excluído por {}", id, current_user.matricula);
        Ok(())
    }
}
