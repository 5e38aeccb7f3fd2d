pub mod analytics;
pub mod auth;
pub mod consumption_service;
pub mod export_service;
pub mod import_service;
pub mod product_service;
pub mod report_service;
pub mod sector_service;
pub mod stock_service;
pub mod user_service;
