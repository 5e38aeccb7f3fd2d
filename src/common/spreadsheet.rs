// src/common/spreadsheet.rs
//
// Leitura (calamine) e escrita (umya-spreadsheet) de planilhas.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use crate::common::error::AppError;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Converte um `Data` do calamine em texto. Inteiros guardados como float
/// ("12.0") saem sem a parte decimal.
pub fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if (f.floor() - f).abs() < f64::EPSILON {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => format!("{}", i),
        Data::Bool(b) => format!("{}", b),
        Data::Empty => String::new(),
        Data::Error(_) => String::new(),
        Data::DateTime(s) => s.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Lê a primeira aba do arquivo como linhas de texto (cabeçalho incluído).
/// O formato é inferido pela extensão (xlsx, xls, ods...).
pub fn read_first_sheet<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>, AppError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::BadRequest(format!("Não foi possível ler a planilha: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::BadRequest("A planilha não possui nenhuma aba.".into()))?
        .map_err(|e| AppError::BadRequest(format!("Não foi possível ler a planilha: {e}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

/// Uma aba a ser exportada: título, cabeçalho e linhas.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub title: String,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(title: impl Into<String>, headers: Vec<&'static str>) -> Self {
        Self { title: title.into(), headers, rows: Vec::new() }
    }

    pub fn push(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }
}

/// Gera o conteúdo de um arquivo xlsx em memória.
pub fn write_xlsx(sheets: &[Sheet]) -> Result<Vec<u8>, AppError> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();

    for sheet in sheets {
        let ws = book
            .new_sheet(sheet.title.clone())
            .map_err(|e| anyhow::anyhow!("Falha ao criar aba '{}': {}", sheet.title, e))?;

        for (col, header) in sheet.headers.iter().enumerate() {
            ws.get_cell_mut((col as u32 + 1, 1)).set_value(*header);
        }

        for (r, row) in sheet.rows.iter().enumerate() {
            let row_idx = r as u32 + 2;
            for (c, value) in row.iter().enumerate() {
                let coord = (c as u32 + 1, row_idx);
                match value {
                    CellValue::Text(s) => {
                        ws.get_cell_mut(coord).set_value(s.clone());
                    }
                    CellValue::Number(n) => {
                        ws.get_cell_mut(coord).set_value_number(*n);
                    }
                    CellValue::Empty => {}
                }
            }
        }
    }

    let mut buffer = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buffer)
        .map_err(|e| anyhow::anyhow!("Falha ao gerar xlsx: {:?}", e))?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_without_fraction_render_as_integers() {
        assert_eq!(cell_to_string(&Data::Float(12.0)), "12");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::String("  Café ".into())), "Café");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn written_workbook_reads_back() {
        let mut sheet = Sheet::new("Produtos", vec!["nome", "preco"]);
        sheet.push(vec!["Café".into(), 3.5.into()]);
        sheet.push(vec!["Água".into(), CellValue::Empty]);
        let bytes = write_xlsx(&[sheet]).expect("xlsx");

        let path = std::env::temp_dir().join(format!("{}.xlsx", uuid::Uuid::new_v4()));
        std::fs::write(&path, &bytes).unwrap();
        let rows = read_first_sheet(&path).expect("leitura");
        let _ = std::fs::remove_file(&path);

        assert_eq!(rows[0], vec!["nome", "preco"]);
        assert_eq!(rows[1], vec!["Café", "3.5"]);
        assert_eq!(rows[2][0], "Água");
    }
}
