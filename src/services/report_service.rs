// src/services/report_service.rs

use std::collections::HashMap;

use chrono::{DateTime, Days, Utc};
use uuid::Uuid;

use crate::{
    common::{dates::DateRange, error::AppError},
    db::{
        ConsumptionRepository, ProductRepository, ReportRepository, SectorRepository,
        UserRepository, consumption_repo::ConsumptionFilter,
    },
    models::{
        product::Product,
        report::{
            CadencePoint, CadenceProductEntry, CoffeeMachineReport, ConsumptionControlReport,
            ConsumptionFact, DashboardStats, LimitStatus, LowStockEntry, PeriodTotals,
            PredictiveEntry, PredictiveReport, ReportQuery, SectorReport, SectorReportEntry,
            StockoutStatus, TopConsumedEntry, UserConsumptionEntry,
        },
    },
    services::analytics::{self, Metrics, round2},
};

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const MAX_WINDOW_DAYS: u32 = 365;
const DEFAULT_TOP_LIMIT: usize = 10;
const MAX_TOP_LIMIT: usize = 100;
const UNASSIGNED_SECTOR: &str = "Sem setor";

#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    product_repo: ProductRepository,
    user_repo: UserRepository,
    sector_repo: SectorRepository,
    consumption_repo: ConsumptionRepository,
}

fn window_days(query: &ReportQuery) -> u32 {
    query.window_days.unwrap_or(DEFAULT_WINDOW_DAYS).clamp(1, MAX_WINDOW_DAYS)
}

impl ReportService {
    pub fn new(
        report_repo: ReportRepository,
        product_repo: ProductRepository,
        user_repo: UserRepository,
        sector_repo: SectorRepository,
        consumption_repo: ConsumptionRepository,
    ) -> Self {
        Self { report_repo, product_repo, user_repo, sector_repo, consumption_repo }
    }

    // --- 1. Dashboard ---
    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<DashboardStats, AppError> {
        let catalog = self.report_repo.catalog_counts().await?;
        let total_sectors = self.sector_repo.count().await?;
        let total_users = self.user_repo.count().await?;

        // O dia de hoje está sempre contido no mês corrente.
        let month = DateRange::current_month(now);
        let today = DateRange::today(now);
        let facts = self.report_repo.consumption_facts(month, None, None).await?;
        let month_totals = analytics::totals(&facts);
        let today_totals = analytics::totals(facts.iter().filter(|f| today.contains(f.created_at)));

        Ok(DashboardStats {
            total_products: catalog.total_products,
            active_products: catalog.active_products,
            total_sectors,
            total_users,
            low_stock_count: catalog.low_stock_count,
            out_of_stock_count: catalog.out_of_stock_count,
            total_stock_value: round2(catalog.total_stock_value),
            today: PeriodTotals::from(&today_totals),
            month: PeriodTotals::from(&month_totals),
        })
    }

    // --- 2. Estoque baixo ---
    pub async fn low_stock(&self, query: &ReportQuery) -> Result<Vec<LowStockEntry>, AppError> {
        let products = self.product_repo.list_low_stock().await?;
        Ok(products
            .into_iter()
            .filter(|p| query.sector_id.is_none() || p.sector_id == query.sector_id)
            .map(|p| LowStockEntry {
                severity: analytics::low_stock_severity(p.stock_quantity, p.low_stock_threshold),
                product_id: p.id,
                name: p.name,
                sector_name: p.sector_name,
                stock_quantity: p.stock_quantity,
                low_stock_threshold: p.low_stock_threshold,
                min_quantity: p.min_quantity,
            })
            .collect())
    }

    // --- 3. Mais consumidos ---
    pub async fn top_consumed(&self, query: &ReportQuery) -> Result<Vec<TopConsumedEntry>, AppError> {
        let range = DateRange::from_days(query.start_date, query.end_date)?;
        let facts = self
            .report_repo
            .consumption_facts(range, query.sector_id, query.user_id)
            .await?;
        let products = self.products_by_id().await?;

        let mut entries: Vec<TopConsumedEntry> = analytics::aggregate_by(&facts, |f| f.product_id)
            .into_iter()
            .map(|(product_id, m)| {
                let product = products.get(&product_id);
                TopConsumedEntry {
                    product_id,
                    name: product.map(|p| p.name.clone()).unwrap_or_default(),
                    sector_name: product.and_then(|p| p.sector_name.clone()),
                    total_qty: m.quantity,
                    total_value: round2(m.value),
                    consumption_count: m.count,
                    distinct_users: m.distinct_users(),
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.total_qty
                .cmp(&a.total_qty)
                .then(b.total_value.total_cmp(&a.total_value))
                .then_with(|| a.name.cmp(&b.name))
        });
        entries.truncate(query.limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT));
        Ok(entries)
    }

    // --- 4. Gestão por setor ---
    pub async fn sectors(&self, query: &ReportQuery) -> Result<SectorReport, AppError> {
        let range = DateRange::from_days(query.start_date, query.end_date)?;
        let sectors = self.sector_repo.list().await?;
        let products = self.product_repo.list_all().await?;
        let facts = self.report_repo.consumption_facts(range, None, None).await?;

        let consumed = analytics::aggregate_by(&facts, |f| f.sector_id);
        let total_consumed_value: f64 = consumed.values().map(|m| m.value).sum();

        let build = |sector_id: Option<Uuid>, sector_name: String| {
            let in_sector: Vec<&Product> =
                products.iter().filter(|p| p.sector_id == sector_id).collect();
            let m = consumed.get(&sector_id).cloned().unwrap_or_default();
            SectorReportEntry {
                sector_id,
                sector_name,
                product_count: in_sector.len() as i64,
                total_stock: in_sector.iter().map(|p| p.stock_quantity).sum(),
                stock_value: round2(in_sector.iter().map(|p| p.stock_value()).sum()),
                low_stock_count: in_sector.iter().filter(|p| p.is_low_stock()).count() as i64,
                consumed_qty: m.quantity,
                consumed_value: round2(m.value),
                consumption_share_pct: share(m.value, total_consumed_value),
            }
        };

        let mut entries: Vec<SectorReportEntry> = sectors
            .into_iter()
            .filter(|s| query.sector_id.is_none() || Some(s.id) == query.sector_id)
            .map(|s| build(Some(s.id), s.name))
            .collect();

        // Produtos sem setor entram num grupo próprio, só quando existem.
        if query.sector_id.is_none()
            && (products.iter().any(|p| p.sector_id.is_none()) || consumed.contains_key(&None))
        {
            entries.push(build(None, UNASSIGNED_SECTOR.to_string()));
        }

        entries.sort_by(|a, b| b.consumed_value.total_cmp(&a.consumed_value));
        let total_stock_value = round2(entries.iter().map(|e| e.stock_value).sum());
        Ok(SectorReport {
            sectors: entries,
            total_consumed_value: round2(total_consumed_value),
            total_stock_value,
        })
    }

    // --- 5. Cadência da máquina de café ---
    pub async fn coffee_machine(
        &self,
        query: &ReportQuery,
        now: DateTime<Utc>,
    ) -> Result<CoffeeMachineReport, AppError> {
        let window = window_days(query);
        let cadence = query.cadence.unwrap_or_default();
        let range = DateRange::last_days(now, window);

        let sector = match query.sector_id {
            Some(id) => Some(
                self.sector_repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Setor"))?,
            ),
            // Sem filtro, usa o setor cujo nome indica a máquina de café.
            None => self.sector_repo.list().await?.into_iter().find(|s| {
                let name = s.name.to_lowercase();
                name.contains("café") || name.contains("cafe") || name.contains("coffee")
            }),
        };
        let sector_id = sector.as_ref().map(|s| s.id);

        let products: Vec<Product> = self
            .product_repo
            .list_all()
            .await?
            .into_iter()
            .filter(|p| sector_id.is_none() || p.sector_id == sector_id)
            .collect();
        let facts = self.report_repo.consumption_facts(range, sector_id, None).await?;

        let first_day = now.date_naive() - Days::new(u64::from(window - 1));
        let periods = analytics::buckets(first_day, now.date_naive(), cadence);
        let by_period = analytics::aggregate_by(&facts, |f| {
            analytics::bucket_start(f.created_at.date_naive(), cadence)
        });
        let series: Vec<CadencePoint> = periods
            .iter()
            .map(|start| {
                let m = by_period.get(start).cloned().unwrap_or_default();
                CadencePoint {
                    period_start: *start,
                    quantity: m.quantity,
                    value: round2(m.value),
                    count: m.count,
                }
            })
            .collect();

        let by_product = analytics::aggregate_by(&facts, |f| f.product_id);
        let period_count = periods.len().max(1) as f64;
        let mut entries: Vec<CadenceProductEntry> = products
            .iter()
            .map(|p| {
                let m = by_product.get(&p.id).cloned().unwrap_or_default();
                let avg_daily = m.quantity as f64 / f64::from(window);
                let active_ratio = m.active_days() as f64 / f64::from(window);
                let days = analytics::days_until_stockout(p.stock_quantity, avg_daily);
                CadenceProductEntry {
                    product_id: p.id,
                    name: p.name.clone(),
                    total_qty: m.quantity,
                    avg_per_period: round2(m.quantity as f64 / period_count),
                    avg_daily_consumption: round2(avg_daily),
                    active_day_ratio: round2(active_ratio),
                    frequency: analytics::frequency_class(active_ratio),
                    stock_quantity: p.stock_quantity,
                    days_until_stockout: days,
                    stockout_status: analytics::stockout_status(days),
                }
            })
            .collect();
        entries.sort_by(|a, b| b.total_qty.cmp(&a.total_qty).then_with(|| a.name.cmp(&b.name)));

        let totals = analytics::totals(&facts);
        Ok(CoffeeMachineReport {
            sector_id,
            sector_name: sector.map(|s| s.name),
            cadence,
            window_days: window,
            series,
            products: entries,
            total_qty: totals.quantity,
            total_value: round2(totals.value),
        })
    }

    // --- 6. Controle de consumo ---
    /// Sem datas, considera o mês corrente (o limite é mensal).
    pub async fn consumption_control(
        &self,
        query: &ReportQuery,
        now: DateTime<Utc>,
    ) -> Result<ConsumptionControlReport, AppError> {
        let range = if query.start_date.is_none() && query.end_date.is_none() {
            DateRange::current_month(now)
        } else {
            DateRange::from_days(query.start_date, query.end_date)?
        };

        let users = self.user_repo.list().await?;
        let facts = self
            .report_repo
            .consumption_facts(range, query.sector_id, query.user_id)
            .await?;
        let by_user = analytics::aggregate_by(&facts, |f| f.user_id);

        let mut entries: Vec<UserConsumptionEntry> = users
            .into_iter()
            .filter(|u| query.user_id.is_none() || Some(u.id) == query.user_id)
            .map(|u| {
                let m = by_user.get(&u.id).cloned().unwrap_or_default();
                let limit = u.active_limit();
                let (usage, status) = analytics::limit_status(m.value, limit);
                UserConsumptionEntry {
                    user_id: u.id,
                    full_name: u.full_name,
                    matricula: u.matricula,
                    consumption_count: m.count,
                    total_qty: m.quantity,
                    total_value: round2(m.value),
                    monthly_limit: limit,
                    limit_usage_pct: usage,
                    status,
                }
            })
            .collect();
        entries.sort_by(|a, b| {
            b.total_value
                .total_cmp(&a.total_value)
                .then_with(|| a.full_name.cmp(&b.full_name))
        });

        let details = match query.user_id {
            Some(user_id) => {
                let filter = ConsumptionFilter {
                    user_id: Some(user_id),
                    sector_id: query.sector_id,
                    range,
                    ..Default::default()
                };
                self.consumption_repo.list(&filter, None).await?
            }
            None => Vec::new(),
        };

        let totals = analytics::totals(&facts);
        let users_over_limit = entries
            .iter()
            .filter(|e| e.status == LimitStatus::Exceeded)
            .count();
        Ok(ConsumptionControlReport {
            users: entries,
            details,
            total_qty: totals.quantity,
            total_value: round2(totals.value),
            users_over_limit,
        })
    }

    // --- 7. Preditivo / reposição ---
    pub async fn predictive(
        &self,
        query: &ReportQuery,
        now: DateTime<Utc>,
    ) -> Result<PredictiveReport, AppError> {
        let window = window_days(query);
        let range = DateRange::last_days(now, window);
        let facts = self.report_repo.consumption_facts(range, query.sector_id, None).await?;

        // Metades da janela, para a tendência.
        let (first_days, second_days) = analytics::split_window(window);
        let midpoint = range
            .from
            .map(|from| from + chrono::Duration::days(i64::from(first_days)))
            .unwrap_or(now);
        let (first, second): (Vec<&ConsumptionFact>, Vec<&ConsumptionFact>) =
            facts.iter().partition(|f| f.created_at < midpoint);
        let first_half = analytics::aggregate_by(first, |f| f.product_id);
        let second_half = analytics::aggregate_by(second, |f| f.product_id);
        let by_product = analytics::aggregate_by(&facts, |f| f.product_id);

        let products = self.product_repo.list_all().await?;
        let mut entries: Vec<PredictiveEntry> = products
            .into_iter()
            .filter(|p| query.sector_id.is_none() || p.sector_id == query.sector_id)
            .map(|p| {
                let qty = |groups: &HashMap<Uuid, Metrics>| {
                    groups.get(&p.id).map(|m| m.quantity).unwrap_or(0)
                };
                let window_qty = qty(&by_product);
                let avg_daily = window_qty as f64 / f64::from(window);
                let days = analytics::days_until_stockout(p.stock_quantity, avg_daily);
                PredictiveEntry {
                    product_id: p.id,
                    trend: analytics::trend(
                        qty(&first_half) as f64 / f64::from(first_days),
                        qty(&second_half) as f64 / f64::from(second_days),
                    ),
                    status: analytics::stockout_status(days),
                    suggested_reorder_qty: analytics::suggested_reorder(
                        avg_daily,
                        p.stock_quantity,
                        p.max_quantity,
                    ),
                    name: p.name,
                    sector_name: p.sector_name,
                    stock_quantity: p.stock_quantity,
                    window_qty,
                    avg_daily_consumption: round2(avg_daily),
                    days_until_stockout: days,
                }
            })
            .collect();

        // Quem acaba primeiro vem primeiro; sem consumo vai para o fim.
        entries.sort_by(|a, b| match (a.days_until_stockout, b.days_until_stockout) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        });

        let count = |status: StockoutStatus| entries.iter().filter(|e| e.status == status).count();
        let critical_count = count(StockoutStatus::Critical);
        let warning_count = count(StockoutStatus::Warning);
        Ok(PredictiveReport {
            window_days: window,
            products: entries,
            critical_count,
            warning_count,
        })
    }

    async fn products_by_id(&self) -> Result<HashMap<Uuid, Product>, AppError> {
        Ok(self
            .product_repo
            .list_all()
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect())
    }
}

fn share(part: f64, total: f64) -> f64 {
    if total <= 0.0 { 0.0 } else { round2(part * 100.0 / total) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_handles_zero_total() {
        assert_eq!(share(10.0, 0.0), 0.0);
        assert_eq!(share(25.0, 100.0), 25.0);
    }

    #[test]
    fn window_is_clamped() {
        let q = ReportQuery { window_days: Some(0), ..Default::default() };
        assert_eq!(window_days(&q), 1);
        let q = ReportQuery { window_days: Some(9999), ..Default::default() };
        assert_eq!(window_days(&q), MAX_WINDOW_DAYS);
        assert_eq!(window_days(&ReportQuery::default()), DEFAULT_WINDOW_DAYS);
    }
}
