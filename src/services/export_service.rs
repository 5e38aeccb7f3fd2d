// src/services/export_service.rs

use chrono::{DateTime, Utc};

use crate::{
    common::{
        dates::DateRange,
        error::AppError,
        spreadsheet::{CellValue, Sheet, write_xlsx},
    },
    db::consumption_repo::ConsumptionFilter,
    models::{
        consumption::{Consumption, ConsumptionQuery},
        report::{ExportMode, LimitStatus, ReportQuery},
    },
    services::{
        analytics::round2, consumption_service::ConsumptionService, report_service::ReportService,
    },
};

const DETAIL_HEADERS: [&str; 8] = [
    "Data",
    "Usuário",
    "Matrícula",
    "Produto",
    "Setor",
    "Quantidade",
    "Preço unitário",
    "Total",
];

/// Arquivo gerado para download.
#[derive(Debug)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ExportService {
    consumption_service: ConsumptionService,
    report_service: ReportService,
}

fn limit_label(status: LimitStatus) -> &'static str {
    match status {
        LimitStatus::NoLimit => "Sem limite",
        LimitStatus::Ok => "Dentro do limite",
        LimitStatus::NearLimit => "Próximo do limite",
        LimitStatus::Exceeded => "Limite excedido",
    }
}

/// Uma linha por consumo, com linha de totais ao final.
fn detail_sheet(title: &str, rows: &[Consumption]) -> Sheet {
    let mut sheet = Sheet::new(title, DETAIL_HEADERS.to_vec());
    let (mut qty, mut total) = (0_i64, 0.0_f64);
    for c in rows {
        qty += c.qty;
        total += c.total_price;
        sheet.push(vec![
            c.created_at.format("%d/%m/%Y %H:%M").to_string().into(),
            c.user_name.clone().into(),
            c.matricula.clone().into(),
            c.product_name.clone().into(),
            c.sector_name.clone().into(),
            c.qty.into(),
            c.unit_price.into(),
            c.total_price.into(),
        ]);
    }
    sheet.push(vec![
        "TOTAL".into(),
        CellValue::Empty,
        CellValue::Empty,
        CellValue::Empty,
        CellValue::Empty,
        qty.into(),
        CellValue::Empty,
        round2(total).into(),
    ]);
    sheet
}

impl ExportService {
    pub fn new(consumption_service: ConsumptionService, report_service: ReportService) -> Self {
        Self { consumption_service, report_service }
    }

    /// Histórico de consumos com os mesmos filtros da listagem.
    pub async fn consumptions(
        &self,
        query: &ConsumptionQuery,
        now: DateTime<Utc>,
    ) -> Result<ExportFile, AppError> {
        let filter = ConsumptionFilter {
            user_id: query.user_id,
            product_id: query.product_id,
            sector_id: query.sector_id,
            range: DateRange::from_days(query.start_date, query.end_date)?,
        };
        let rows = self.consumption_service.list_all(&filter).await?;
        let bytes = write_xlsx(&[detail_sheet("Consumos", &rows)])?;
        Ok(ExportFile {
            file_name: format!("consumos-{}.xlsx", now.format("%Y-%m-%d")),
            bytes,
        })
    }

    /// Relatório da FoodStation: consolidado por usuário ou detalhado por consumo.
    pub async fn foodstation(&self, query: &ReportQuery, now: DateTime<Utc>) -> Result<ExportFile, AppError> {
        let mode = query.mode.unwrap_or_default();
        let report = self.report_service.consumption_control(query, now).await?;

        let sheet = match mode {
            ExportMode::Consolidated => {
                let mut sheet = Sheet::new(
                    "Consolidado",
                    vec![
                        "Usuário",
                        "Matrícula",
                        "Consumos",
                        "Quantidade",
                        "Total",
                        "Limite mensal",
                        "Uso do limite (%)",
                        "Situação",
                    ],
                );
                let mut count = 0_i64;
                for u in &report.users {
                    count += u.consumption_count;
                    sheet.push(vec![
                        u.full_name.as_str().into(),
                        u.matricula.as_str().into(),
                        u.consumption_count.into(),
                        u.total_qty.into(),
                        u.total_value.into(),
                        u.monthly_limit.into(),
                        u.limit_usage_pct.into(),
                        limit_label(u.status).into(),
                    ]);
                }
                sheet.push(vec![
                    "TOTAL".into(),
                    CellValue::Empty,
                    count.into(),
                    report.total_qty.into(),
                    report.total_value.into(),
                    CellValue::Empty,
                    CellValue::Empty,
                    format!("{} acima do limite", report.users_over_limit).into(),
                ]);
                sheet
            }
            ExportMode::Detailed => {
                let range = if query.start_date.is_none() && query.end_date.is_none() {
                    DateRange::current_month(now)
                } else {
                    DateRange::from_days(query.start_date, query.end_date)?
                };
                let filter = ConsumptionFilter {
                    user_id: query.user_id,
                    sector_id: query.sector_id,
                    range,
                    ..Default::default()
                };
                let rows = self.consumption_service.list_all(&filter).await?;
                detail_sheet("Detalhado", &rows)
            }
        };

        let suffix = match mode {
            ExportMode::Consolidated => "consolidado",
            ExportMode::Detailed => "detalhado",
        };
        Ok(ExportFile {
            file_name: format!("foodstation-{}-{}.xlsx", suffix, now.format("%Y-%m-%d")),
            bytes: write_xlsx(&[sheet])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn consumption(qty: i64, unit_price: f64) -> Consumption {
        Consumption {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_name: Some("Ana".into()),
            matricula: Some("123".into()),
            product_id: Uuid::new_v4(),
            product_name: Some("Café".into()),
            sector_id: None,
            sector_name: None,
            qty,
            unit_price,
            total_price: unit_price * qty as f64,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn detail_sheet_ends_with_totals() {
        let sheet = detail_sheet("Consumos", &[consumption(2, 2.5), consumption(1, 1.25)]);
        assert_eq!(sheet.rows.len(), 3);
        let last = sheet.rows.last().unwrap();
        assert_eq!(last[0], CellValue::Text("TOTAL".into()));
        assert_eq!(last[5], CellValue::Number(3.0));
        assert_eq!(last[7], CellValue::Number(6.25));
        assert_eq!(sheet.rows[0][4], CellValue::Empty);
    }
}
