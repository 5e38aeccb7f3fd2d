// src/lib.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{
    common::storage::PUBLIC_PREFIX, config::AppState, docs::ApiDoc,
    middleware::auth::auth_guard,
};

/// Monta o roteador completo da API.
pub fn create_app(app_state: AppState) -> Router {
    // Rotas públicas de autenticação
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout));

    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users).post(handlers::users::create_user))
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        );

    let sector_routes = Router::new()
        .route("/", get(handlers::sectors::list_sectors).post(handlers::sectors::create_sector))
        .route(
            "/{id}",
            axum::routing::put(handlers::sectors::update_sector)
                .delete(handlers::sectors::delete_sector),
        );

    let product_routes = Router::new()
        .route(
            "/",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route("/low-stock", get(handlers::products::low_stock))
        .route("/bulk-import", post(handlers::products::bulk_import))
        .route(
            "/{id}",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route(
            "/{id}/photo",
            post(handlers::products::upload_photo).delete(handlers::products::delete_photo),
        );

    let stock_routes = Router::new()
        .route(
            "/",
            get(handlers::stock_transactions::list_transactions)
                .post(handlers::stock_transactions::create_transaction),
        )
        .route(
            "/{id}",
            axum::routing::delete(handlers::stock_transactions::delete_transaction),
        );

    let consumption_routes = Router::new()
        .route(
            "/",
            get(handlers::consumptions::list_consumptions)
                .post(handlers::consumptions::create_consumption),
        )
        .route("/recent", get(handlers::consumptions::recent_consumptions))
        .route("/me/summary", get(handlers::consumptions::my_summary))
        .route("/export", get(handlers::consumptions::export_consumptions))
        .route(
            "/{id}",
            axum::routing::put(handlers::consumptions::update_consumption)
                .delete(handlers::consumptions::delete_consumption),
        );

    let report_routes = Router::new()
        .route("/dashboard", get(handlers::reports::dashboard))
        .route("/low-stock", get(handlers::reports::low_stock))
        .route("/top-consumed", get(handlers::reports::top_consumed))
        .route("/sectors", get(handlers::reports::sectors))
        .route("/coffee-machine", get(handlers::reports::coffee_machine))
        .route("/consumption-control", get(handlers::reports::consumption_control))
        .route("/predictive", get(handlers::reports::predictive))
        .route("/foodstation/export", get(handlers::reports::foodstation_export));

    // Tudo abaixo exige o token (cookie ou Bearer)
    let protected = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .nest("/api/users", user_routes)
        .nest("/api/sectors", sector_routes)
        .nest("/api/products", product_routes)
        .nest("/api/stock-transactions", stock_routes)
        .nest("/api/consumptions", consumption_routes)
        .nest("/api/reports", report_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let mut app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(app_state.uploads.root()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(app_state.settings.max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    if let Some(origin) = app_state.settings.cors_origin.as_deref() {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                let cors = CorsLayer::new()
                    .allow_origin(origin)
                    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                    .allow_credentials(true);
                app = app.layer(cors);
            }
            Err(e) => tracing::warn!("CORS_ORIGIN inválido ({}): {}", origin, e),
        }
    }

    app.with_state(app_state)
}
