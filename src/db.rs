use sqlx::{Sqlite, SqlitePool, Transaction};

pub mod user_repo;
pub use user_repo::UserRepository;
pub mod sector_repo;
pub use sector_repo::SectorRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod stock_repo;
pub use stock_repo::StockRepository;
pub mod consumption_repo;
pub use consumption_repo::ConsumptionRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;

/// Transação de escrita: `BEGIN IMMEDIATE` pega o lock já no início, e a
/// espera fica por conta do `busy_timeout`.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}
