// src/services/analytics.rs
//
// Agregações e classificações puras usadas por todos os relatórios.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::dates::{month_start, week_start},
    models::report::{
        Cadence, ConsumptionFact, FrequencyClass, LimitStatus, LowStockSeverity, PeriodTotals,
        StockoutStatus, Trend,
    },
};

pub const CRITICAL_DAYS: f64 = 7.0;
pub const WARNING_DAYS: f64 = 14.0;
pub const HIGH_FREQUENCY_RATIO: f64 = 0.7;
pub const MEDIUM_FREQUENCY_RATIO: f64 = 0.3;
pub const TREND_TOLERANCE: f64 = 0.10;
pub const NEAR_LIMIT_PCT: f64 = 80.0;
pub const REORDER_COVERAGE_DAYS: f64 = 30.0;

/// Métricas de um grupo de consumos.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    pub count: i64,
    pub quantity: i64,
    pub value: f64,
    users: HashSet<Uuid>,
    days: HashSet<NaiveDate>,
}

impl Metrics {
    pub fn add(&mut self, fact: &ConsumptionFact) {
        self.count += 1;
        self.quantity += fact.qty;
        self.value += fact.total_price;
        self.users.insert(fact.user_id);
        self.days.insert(fact.created_at.date_naive());
    }

    pub fn distinct_users(&self) -> usize {
        self.users.len()
    }

    /// Dias distintos com pelo menos um consumo.
    pub fn active_days(&self) -> usize {
        self.days.len()
    }
}

impl From<&Metrics> for PeriodTotals {
    fn from(m: &Metrics) -> Self {
        Self {
            count: m.count,
            quantity: m.quantity,
            value: round2(m.value),
            distinct_users: m.distinct_users(),
        }
    }
}

/// Agrupa os fatos por uma chave arbitrária.
pub fn aggregate_by<'a, K, I, F>(facts: I, key: F) -> HashMap<K, Metrics>
where
    K: Eq + Hash,
    I: IntoIterator<Item = &'a ConsumptionFact>,
    F: Fn(&ConsumptionFact) -> K,
{
    let mut groups: HashMap<K, Metrics> = HashMap::new();
    for fact in facts {
        groups.entry(key(fact)).or_default().add(fact);
    }
    groups
}

pub fn totals<'a, I>(facts: I) -> Metrics
where
    I: IntoIterator<Item = &'a ConsumptionFact>,
{
    let mut m = Metrics::default();
    for fact in facts {
        m.add(fact);
    }
    m
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// --- Classificações ---

pub fn low_stock_severity(stock: i64, threshold: i64) -> LowStockSeverity {
    if stock <= 0 {
        LowStockSeverity::Out
    } else if stock * 2 <= threshold {
        LowStockSeverity::Critical
    } else {
        LowStockSeverity::Low
    }
}

pub fn frequency_class(active_day_ratio: f64) -> FrequencyClass {
    if active_day_ratio >= HIGH_FREQUENCY_RATIO {
        FrequencyClass::High
    } else if active_day_ratio >= MEDIUM_FREQUENCY_RATIO {
        FrequencyClass::Medium
    } else {
        FrequencyClass::Low
    }
}

/// Nulo quando não há consumo (média zero).
pub fn days_until_stockout(stock: i64, avg_daily: f64) -> Option<f64> {
    if avg_daily <= 0.0 {
        return None;
    }
    Some((stock.max(0) as f64 / avg_daily * 10.0).round() / 10.0)
}

pub fn stockout_status(days: Option<f64>) -> StockoutStatus {
    match days {
        None => StockoutStatus::NoConsumption,
        Some(d) if d <= CRITICAL_DAYS => StockoutStatus::Critical,
        Some(d) if d <= WARNING_DAYS => StockoutStatus::Warning,
        Some(_) => StockoutStatus::Ok,
    }
}

/// Compara a segunda metade da janela com a primeira.
pub fn trend(first_half_avg: f64, second_half_avg: f64) -> Trend {
    if first_half_avg <= 0.0 {
        return if second_half_avg > 0.0 { Trend::Increasing } else { Trend::Stable };
    }
    let change = (second_half_avg - first_half_avg) / first_half_avg;
    if change > TREND_TOLERANCE {
        Trend::Increasing
    } else if change < -TREND_TOLERANCE {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Divide a janela em duas metades, em dias. Em janelas ímpares a segunda
/// metade fica com o dia a mais.
pub fn split_window(window_days: u32) -> (u32, u32) {
    let first = (window_days / 2).max(1);
    (first, window_days.saturating_sub(first).max(1))
}

/// Percentual de uso do limite e a situação correspondente.
pub fn limit_status(total: f64, limit: Option<f64>) -> (Option<f64>, LimitStatus) {
    match limit {
        None => (None, LimitStatus::NoLimit),
        Some(l) if l <= 0.0 => {
            let status = if total > 0.0 { LimitStatus::Exceeded } else { LimitStatus::Ok };
            (None, status)
        }
        Some(l) => {
            let pct = total * 100.0 / l;
            let status = if pct > 100.0 {
                LimitStatus::Exceeded
            } else if pct >= NEAR_LIMIT_PCT {
                LimitStatus::NearLimit
            } else {
                LimitStatus::Ok
            };
            (Some(round2(pct)), status)
        }
    }
}

/// Quantidade para cobrir o consumo previsto, limitada pelo estoque máximo.
pub fn suggested_reorder(avg_daily: f64, stock: i64, max_quantity: Option<i64>) -> i64 {
    let target = (avg_daily * REORDER_COVERAGE_DAYS).ceil() as i64;
    let mut need = (target - stock).max(0);
    if let Some(max) = max_quantity {
        need = need.min((max - stock).max(0));
    }
    need
}

pub fn bucket_start(day: NaiveDate, cadence: Cadence) -> NaiveDate {
    match cadence {
        Cadence::Daily => day,
        Cadence::Weekly => week_start(day),
        Cadence::Monthly => month_start(day),
    }
}

/// Inícios de período que cobrem `[first, last]`, em ordem.
pub fn buckets(first: NaiveDate, last: NaiveDate, cadence: Cadence) -> Vec<NaiveDate> {
    let mut out: Vec<NaiveDate> = Vec::new();
    let mut day = first;
    while day <= last {
        let start = bucket_start(day, cadence);
        if out.last() != Some(&start) {
            out.push(start);
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn fact(user: Uuid, product: Uuid, qty: i64, price: f64, day: u32) -> ConsumptionFact {
        ConsumptionFact {
            user_id: user,
            product_id: product,
            sector_id: None,
            qty,
            total_price: price * qty as f64,
            created_at: Utc.with_ymd_and_hms(2025, 6, day, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn aggregation_groups_by_key() {
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
        let facts = vec![
            fact(u1, p1, 2, 2.5, 1),
            fact(u2, p1, 1, 2.5, 1),
            fact(u1, p2, 3, 1.0, 2),
            fact(u1, p1, 1, 2.5, 3),
        ];

        let by_product = aggregate_by(&facts, |f| f.product_id);
        let m = &by_product[&p1];
        assert_eq!(m.count, 3);
        assert_eq!(m.quantity, 4);
        assert!((m.value - 10.0).abs() < 1e-9);
        assert_eq!(m.distinct_users(), 2);
        assert_eq!(m.active_days(), 2);

        let all = totals(&facts);
        assert_eq!(all.quantity, 7);
        assert_eq!(PeriodTotals::from(&all).distinct_users, 2);
    }

    #[test]
    fn stockout_is_null_without_consumption() {
        assert_eq!(days_until_stockout(50, 0.0), None);
        assert_eq!(stockout_status(None), StockoutStatus::NoConsumption);
        assert_eq!(days_until_stockout(10, 2.0), Some(5.0));
        assert_eq!(stockout_status(Some(5.0)), StockoutStatus::Critical);
        assert_eq!(stockout_status(Some(14.0)), StockoutStatus::Warning);
        assert_eq!(stockout_status(Some(14.1)), StockoutStatus::Ok);
    }

    #[test]
    fn severity_and_frequency_thresholds() {
        assert_eq!(low_stock_severity(0, 10), LowStockSeverity::Out);
        assert_eq!(low_stock_severity(5, 10), LowStockSeverity::Critical);
        assert_eq!(low_stock_severity(6, 10), LowStockSeverity::Low);
        assert_eq!(frequency_class(0.7), FrequencyClass::High);
        assert_eq!(frequency_class(0.3), FrequencyClass::Medium);
        assert_eq!(frequency_class(0.29), FrequencyClass::Low);
    }

    #[test]
    fn trend_uses_ten_percent_tolerance() {
        assert_eq!(trend(10.0, 11.0), Trend::Stable);
        assert_eq!(trend(10.0, 12.0), Trend::Increasing);
        assert_eq!(trend(10.0, 8.0), Trend::Decreasing);
        assert_eq!(trend(0.0, 0.0), Trend::Stable);
        assert_eq!(trend(0.0, 3.0), Trend::Increasing);
    }

    #[test]
    fn odd_windows_compare_daily_averages() {
        assert_eq!(split_window(30), (15, 15));
        assert_eq!(split_window(31), (15, 16));
        assert_eq!(split_window(1), (1, 1));
        // Um por dia nas duas metades: 15 contra 16 unidades continua estável.
        let (first, second) = split_window(31);
        assert_eq!(trend(15.0 / f64::from(first), 16.0 / f64::from(second)), Trend::Stable);
    }

    #[test]
    fn limit_usage_classification() {
        assert_eq!(limit_status(10.0, None), (None, LimitStatus::NoLimit));
        assert_eq!(limit_status(50.0, Some(100.0)), (Some(50.0), LimitStatus::Ok));
        assert_eq!(limit_status(80.0, Some(100.0)), (Some(80.0), LimitStatus::NearLimit));
        assert_eq!(limit_status(100.0, Some(100.0)).1, LimitStatus::NearLimit);
        assert_eq!(limit_status(100.5, Some(100.0)).1, LimitStatus::Exceeded);
    }

    #[test]
    fn reorder_covers_thirty_days_capped_by_max() {
        assert_eq!(suggested_reorder(2.0, 10, None), 50);
        assert_eq!(suggested_reorder(2.0, 10, Some(40)), 30);
        assert_eq!(suggested_reorder(0.0, 10, None), 0);
        assert_eq!(suggested_reorder(1.0, 100, Some(50)), 0);
    }

    #[test]
    fn weekly_buckets_start_on_monday() {
        let first = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(); // quinta
        let last = NaiveDate::from_ymd_opt(2025, 5, 14).unwrap();
        let weeks = buckets(first, last, Cadence::Weekly);
        assert_eq!(
            weeks,
            vec![
                NaiveDate::from_ymd_opt(2025, 4, 28).unwrap(),
                NaiveDate::from_ymd_opt(2025, 5, 5).unwrap(),
                NaiveDate::from_ymd_opt(2025, 5, 12).unwrap(),
            ]
        );
        assert_eq!(buckets(first, last, Cadence::Daily).len(), 14);
        assert_eq!(buckets(first, last, Cadence::Monthly).len(), 1);
    }
}
