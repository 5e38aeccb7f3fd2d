// src/common/dates.rs

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};

use crate::common::error::AppError;

/// Intervalo semiaberto `[from, to)` em UTC. Qualquer ponta pode ficar aberta.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Converte datas de calendário inclusivas (`start_date`..=`end_date`).
    pub fn from_days(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, AppError> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(AppError::BadRequest(
                    "A data inicial não pode ser posterior à data final.".into(),
                ));
            }
        }
        Ok(Self {
            from: start.map(start_of_day),
            to: end.and_then(|d| d.checked_add_days(Days::new(1))).map(start_of_day),
        })
    }

    /// Os últimos `days` dias, terminando no fim do dia de `now`.
    pub fn last_days(now: DateTime<Utc>, days: u32) -> Self {
        let end = now.date_naive();
        let start = end
            .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
            .unwrap_or(end);
        Self {
            from: Some(start_of_day(start)),
            to: end.checked_add_days(Days::new(1)).map(start_of_day),
        }
    }

    pub fn today(now: DateTime<Utc>) -> Self {
        Self::last_days(now, 1)
    }

    pub fn current_month(now: DateTime<Utc>) -> Self {
        let first = month_start(now.date_naive());
        let next = first
            .checked_add_months(chrono::Months::new(1))
            .map(start_of_day);
        Self { from: Some(start_of_day(first)), to: next }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|f| at >= f) && self.to.is_none_or(|t| at < t)
    }

    /// Quantidade de dias cobertos, quando as duas pontas existem.
    pub fn days(&self) -> Option<i64> {
        match (self.from, self.to) {
            (Some(f), Some(t)) => Some((t - f).num_days().max(1)),
            _ => None,
        }
    }
}

pub fn start_of_day(d: NaiveDate) -> DateTime<Utc> {
    d.and_time(NaiveTime::MIN).and_utc()
}

pub fn month_start(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

/// Início da semana (segunda-feira) que contém `d`.
pub fn week_start(d: NaiveDate) -> NaiveDate {
    let offset = d.weekday().num_days_from_monday();
    d.checked_sub_days(Days::new(u64::from(offset))).unwrap_or(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn inclusive_end_day_is_covered() {
        let range = DateRange::from_days(Some(day(2025, 3, 1)), Some(day(2025, 3, 31))).unwrap();
        assert!(range.contains(Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2025, 2, 28, 23, 0, 0).unwrap()));
        assert_eq!(range.days(), Some(31));
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(DateRange::from_days(Some(day(2025, 3, 2)), Some(day(2025, 3, 1))).is_err());
    }

    #[test]
    fn open_range_contains_everything() {
        let range = DateRange::from_days(None, None).unwrap();
        assert!(range.contains(Utc::now()));
        assert_eq!(range.days(), None);
    }

    #[test]
    fn last_days_counts_today() {
        let now = Utc.with_ymd_and_hms(2025, 5, 10, 15, 0, 0).unwrap();
        let range = DateRange::last_days(now, 7);
        assert_eq!(range.from, Some(start_of_day(day(2025, 5, 4))));
        assert_eq!(range.days(), Some(7));
        assert!(range.contains(now));
    }

    #[test]
    fn current_month_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 12, 15, 8, 0, 0).unwrap();
        let range = DateRange::current_month(now);
        assert_eq!(range.from, Some(start_of_day(day(2024, 12, 1))));
        assert_eq!(range.to, Some(start_of_day(day(2025, 1, 1))));
    }

    #[test]
    fn week_starts_on_monday() {
        // 2025-05-08 é uma quinta-feira
        assert_eq!(week_start(day(2025, 5, 8)), day(2025, 5, 5));
        assert_eq!(week_start(day(2025, 5, 5)), day(2025, 5, 5));
    }
}
