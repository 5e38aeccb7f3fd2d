// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::me,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        // --- Sectors ---
        handlers::sectors::list_sectors,
        handlers::sectors::create_sector,
        handlers::sectors::update_sector,
        handlers::sectors::delete_sector,

        // --- Products ---
        handlers::products::list_products,
        handlers::products::low_stock,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::products::upload_photo,
        handlers::products::delete_photo,
        handlers::products::bulk_import,

        // --- Stock ---
        handlers::stock_transactions::list_transactions,
        handlers::stock_transactions::create_transaction,
        handlers::stock_transactions::delete_transaction,

        // --- Consumptions ---
        handlers::consumptions::list_consumptions,
        handlers::consumptions::create_consumption,
        handlers::consumptions::recent_consumptions,
        handlers::consumptions::my_summary,
        handlers::consumptions::update_consumption,
        handlers::consumptions::delete_consumption,
        handlers::consumptions::export_consumptions,

        // --- Reports ---
        handlers::reports::dashboard,
        handlers::reports::low_stock,
        handlers::reports::top_consumed,
        handlers::reports::sectors,
        handlers::reports::coffee_machine,
        handlers::reports::consumption_control,
        handlers::reports::predictive,
        handlers::reports::foodstation_export,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::MessageResponse,

            // --- Users ---
            models::user::Role,
            models::user::User,
            models::user::CreateUserPayload,
            models::user::UpdateUserPayload,

            // --- Sectors ---
            models::sector::Sector,
            models::sector::SectorPayload,

            // --- Products ---
            models::product::ProductStatus,
            models::product::Product,
            models::product::CreateProductPayload,
            models::product::UpdateProductPayload,
            models::product::ImportResult,

            // --- Stock ---
            models::stock::TransactionType,
            models::stock::StockTransaction,
            models::stock::CreateStockTransactionPayload,

            // --- Consumptions ---
            models::consumption::Consumption,
            models::consumption::CreateConsumptionPayload,
            models::consumption::UpdateConsumptionPayload,
            models::consumption::ConsumptionSummary,

            // --- Reports ---
            models::report::Cadence,
            models::report::ExportMode,
            models::report::LowStockSeverity,
            models::report::FrequencyClass,
            models::report::StockoutStatus,
            models::report::Trend,
            models::report::LimitStatus,
            models::report::DashboardStats,
            models::report::PeriodTotals,
            models::report::LowStockEntry,
            models::report::TopConsumedEntry,
            models::report::SectorReportEntry,
            models::report::SectorReport,
            models::report::CadencePoint,
            models::report::CadenceProductEntry,
            models::report::CoffeeMachineReport,
            models::report::UserConsumptionEntry,
            models::report::ConsumptionControlReport,
            models::report::PredictiveEntry,
            models::report::PredictiveReport,
        )
    ),
    tags(
        (name = "Auth", description = "Login por matrícula e sessão"),
        (name = "Users", description = "Cadastro de usuários e limites mensais"),
        (name = "Sectors", description = "Setores do estoque"),
        (name = "Products", description = "Catálogo, fotos e importação por planilha"),
        (name = "Stock", description = "Movimentações de estoque"),
        (name = "Consumptions", description = "Consumos da FoodStation"),
        (name = "Reports", description = "Indicadores, relatórios e exportações")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
