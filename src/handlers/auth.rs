// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AUTH_COOKIE, AuthenticatedUser},
    models::{
        auth::{AuthResponse, LoginPayload, MessageResponse},
        user::User,
    },
};

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login realizado; o token também vai no cookie", body = AuthResponse),
        (status = 401, description = "Matrícula ou senha inválidos")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (token, user) = app_state
        .auth_service
        .login(&payload.matricula, payload.password.as_deref())
        .await?;

    let cookie = Cookie::build((AUTH_COOKIE, token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(app_state.settings.cookie_secure)
        .path("/");

    Ok((StatusCode::OK, jar.add(cookie), Json(AuthResponse { token, user })))
}

// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Cookie removido", body = MessageResponse)
    )
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::build(AUTH_COOKIE).path("/")),
        Json(MessageResponse { message: "Logout realizado.".into() }),
    )
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuário autenticado", body = User),
        (status = 401, description = "Não autenticado")
    ),
    security(("api_jwt" = []))
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}
