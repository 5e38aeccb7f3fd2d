// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

use crate::{
    common::storage::UploadStore,
    db::{
        ConsumptionRepository, ProductRepository, ReportRepository, SectorRepository,
        StockRepository, UserRepository,
    },
    services::{
        auth::AuthService, consumption_service::ConsumptionService,
        export_service::ExportService, import_service::ImportService,
        product_service::ProductService, report_service::ReportService,
        sector_service::SectorService, stock_service::StockService,
        user_service::UserService,
    },
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub cookie_secure: bool,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub bind_addr: String,
    pub cors_origin: Option<String>,
    pub admin_seed: Option<AdminSeed>,
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub matricula: String,
    pub password: String,
    pub full_name: String,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let admin_seed = match (env::var("ADMIN_MATRICULA"), env::var("ADMIN_PASSWORD")) {
            (Ok(matricula), Ok(password)) if !matricula.is_empty() && !password.is_empty() => {
                Some(AdminSeed {
                    matricula,
                    password,
                    full_name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrador".into()),
                })
            }
            _ => None,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/foodstation.db".into()),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            jwt_ttl_hours: parse_var("JWT_TTL_HOURS", 24 * 7)?,
            cookie_secure: parse_var("COOKIE_SECURE", false)?,
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
            admin_seed,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Valor inválido para {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

/// Abre (criando se preciso) o banco SQLite com chaves estrangeiras ativas.
pub async fn connect_pool(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
    Ok(pool)
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub settings: Arc<Settings>,
    pub uploads: UploadStore,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub sector_service: SectorService,
    pub product_service: ProductService,
    pub import_service: ImportService,
    pub stock_service: StockService,
    pub consumption_service: ConsumptionService,
    pub report_service: ReportService,
    pub export_service: ExportService,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let pool = connect_pool(&settings.database_url, settings.database_max_connections).await?;
        Ok(Self::with_pool(pool, settings))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: SqlitePool, settings: Settings) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let sector_repo = SectorRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let stock_repo = StockRepository::new(db_pool.clone());
        let consumption_repo = ConsumptionRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());
        let uploads = UploadStore::new(&settings.upload_dir);

        let auth_service = AuthService::new(
            user_repo.clone(),
            settings.jwt_secret.clone(),
            settings.jwt_ttl_hours,
        );
        let user_service = UserService::new(user_repo.clone());
        let sector_service = SectorService::new(sector_repo.clone());
        let stock_service =
            StockService::new(db_pool.clone(), product_repo.clone(), stock_repo);
        let product_service = ProductService::new(
            db_pool.clone(),
            product_repo.clone(),
            stock_service.clone(),
            uploads.clone(),
        );
        let import_service =
            ImportService::new(sector_repo.clone(), product_service.clone(), uploads.clone());
        let consumption_service = ConsumptionService::new(
            db_pool.clone(),
            consumption_repo.clone(),
            product_repo.clone(),
            user_repo.clone(),
            stock_service.clone(),
        );
        let report_service = ReportService::new(
            report_repo,
            product_repo,
            user_repo,
            sector_repo,
            consumption_repo,
        );
        let export_service =
            ExportService::new(consumption_service.clone(), report_service.clone());

        Self {
            db_pool,
            settings: Arc::new(settings),
            uploads,
            auth_service,
            user_service,
            sector_service,
            product_service,
            import_service,
            stock_service,
            consumption_service,
            report_service,
            export_service,
        }
    }
}
