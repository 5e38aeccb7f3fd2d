// src/services/import_service.rs

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        spreadsheet::read_first_sheet,
        storage::{UploadStore, remove_file_best_effort},
    },
    db::SectorRepository,
    models::product::{DEFAULT_LOW_STOCK_THRESHOLD, ImportResult, NewProduct},
    services::product_service::ProductService,
};

// --- Mapeamento de colunas pelo cabeçalho ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Sku,
    Category,
    Unit,
    UnitPrice,
    SalePrice,
    Quantity,
    Sector,
    Threshold,
    Supplier,
}

impl Column {
    fn from_header(raw: &str) -> Option<Self> {
        let key = normalize_header(raw);
        let column = match key.as_str() {
            "nome" | "name" | "produto" | "product" => Column::Name,
            "sku" | "codigo" | "code" => Column::Sku,
            "categoria" | "category" => Column::Category,
            "unidade" | "unit" => Column::Unit,
            "preco" | "price" | "unit_price" | "preco_unitario" | "valor" => Column::UnitPrice,
            "preco_venda" | "sale_price" => Column::SalePrice,
            "quantidade" | "quantity" | "qtd" | "estoque" | "stock" => Column::Quantity,
            "setor" | "sector" => Column::Sector,
            "limite" | "low_stock_threshold" | "limite_estoque" => Column::Threshold,
            "fornecedor" | "supplier" => Column::Supplier,
            _ => return None,
        };
        Some(column)
    }
}

/// Minúsculas, sem acentos, espaços e hífens viram `_`.
fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            ' ' | '-' => '_',
            other => other,
        })
        .collect()
}

#[derive(Debug, Default)]
struct ColumnMap {
    positions: Vec<(Column, usize)>,
}

impl ColumnMap {
    fn from_header(header: &[String]) -> Result<Self, AppError> {
        let mut positions = Vec::new();
        for (idx, cell) in header.iter().enumerate() {
            if let Some(col) = Column::from_header(cell) {
                if !positions.iter().any(|(c, _)| *c == col) {
                    positions.push((col, idx));
                }
            }
        }
        if !positions.iter().any(|(c, _)| *c == Column::Name) {
            return Err(AppError::BadRequest(
                "A planilha precisa de uma coluna 'nome' no cabeçalho.".into(),
            ));
        }
        Ok(Self { positions })
    }

    fn get<'a>(&self, row: &'a [String], col: Column) -> Option<&'a str> {
        let idx = self.positions.iter().find(|(c, _)| *c == col)?.1;
        row.get(idx).map(|s| s.trim()).filter(|s| !s.is_empty())
    }
}

/// Linha já validada, ainda com o setor por nome.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    /// Linha da planilha (1 = cabeçalho)
    pub line: usize,
    pub product: NewProduct,
    pub sector: Option<String>,
}

fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.replace("R$", "").replace(' ', "");
    // "2,50" e "1.234,50" (formato brasileiro)
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_non_negative(raw: Option<&str>, label: &str) -> Result<Option<f64>, String> {
    match raw {
        None => Ok(None),
        Some(v) => match parse_number(v) {
            Some(n) if n >= 0.0 => Ok(Some(n)),
            Some(_) => Err(format!("{label} não pode ser negativo")),
            None => Err(format!("{label} inválido: '{v}'")),
        },
    }
}

fn parse_count(raw: Option<&str>, label: &str) -> Result<Option<i64>, String> {
    match parse_non_negative(raw, label)? {
        Some(n) if n.fract() != 0.0 => Err(format!("{label} deve ser um número inteiro")),
        Some(n) => Ok(Some(n as i64)),
        None => Ok(None),
    }
}

fn parse_row(map: &ColumnMap, cells: &[String], line: usize) -> Result<ImportRow, String> {
    let name = map.get(cells, Column::Name).ok_or("Nome é obrigatório")?;
    let unit_price = parse_non_negative(map.get(cells, Column::UnitPrice), "Preço")?;
    let sale_price = parse_non_negative(map.get(cells, Column::SalePrice), "Preço de venda")?;
    let quantity = parse_count(map.get(cells, Column::Quantity), "Quantidade")?;
    let threshold = parse_count(map.get(cells, Column::Threshold), "Limite de estoque")?;

    let mut product = NewProduct::named(name);
    product.sku = map.get(cells, Column::Sku).map(str::to_string);
    product.category = map.get(cells, Column::Category).map(str::to_string);
    if let Some(unit) = map.get(cells, Column::Unit) {
        product.unit = unit.to_string();
    }
    product.unit_price = unit_price.unwrap_or(0.0);
    product.sale_price = sale_price;
    product.stock_quantity = quantity.unwrap_or(0);
    product.low_stock_threshold = threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    product.supplier = map.get(cells, Column::Supplier).map(str::to_string);

    Ok(ImportRow {
        line,
        product,
        sector: map.get(cells, Column::Sector).map(str::to_string),
    })
}

/// Valida cada linha de dados de forma independente. Linhas totalmente
/// vazias são ignoradas. Erros saem como "Linha {n}: ...".
pub fn parse_sheet(rows: &[Vec<String>]) -> Result<(Vec<ImportRow>, Vec<String>), AppError> {
    let Some((header, data)) = rows.split_first() else {
        return Err(AppError::BadRequest("A planilha está vazia.".into()));
    };
    let map = ColumnMap::from_header(header)?;

    let mut parsed = Vec::new();
    let mut errors = Vec::new();
    for (idx, cells) in data.iter().enumerate() {
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        // idx 0 é a linha 2 da planilha
        let line = idx + 2;
        match parse_row(&map, cells, line) {
            Ok(row) => parsed.push(row),
            Err(msg) => errors.push(format!("Linha {line}: {msg}")),
        }
    }
    Ok((parsed, errors))
}

#[derive(Clone)]
pub struct ImportService {
    sector_repo: SectorRepository,
    product_service: ProductService,
    uploads: UploadStore,
}

impl ImportService {
    pub fn new(sector_repo: SectorRepository, product_service: ProductService, uploads: UploadStore) -> Self {
        Self { sector_repo, product_service, uploads }
    }

    /// Grava o arquivo, lê a primeira aba e remove o arquivo ao final.
    pub async fn import_file(
        &self,
        original_name: Option<&str>,
        bytes: &[u8],
        user_id: Option<Uuid>,
    ) -> Result<ImportResult, AppError> {
        let stored = self.uploads.save("import", original_name, bytes).await?;
        let path = stored.disk_path.clone();
        let read = tokio::task::spawn_blocking(move || read_first_sheet(&path))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de leitura da planilha: {}", e));
        remove_file_best_effort(&stored.disk_path).await;

        let rows = read??;
        self.import_rows(&rows, user_id).await
    }

    pub async fn import_rows(
        &self,
        rows: &[Vec<String>],
        user_id: Option<Uuid>,
    ) -> Result<ImportResult, AppError> {
        let (parsed, mut errors) = parse_sheet(rows)?;

        let mut products = Vec::with_capacity(parsed.len());
        for row in parsed {
            let mut product = row.product;
            // O setor é resolvido antes da linha entrar no lote.
            if let Some(sector_name) = row.sector.as_deref() {
                match self.sector_repo.find_by_name(sector_name).await? {
                    Some(sector) => product.sector_id = Some(sector.id),
                    None => {
                        errors.push(format!(
                            "Linha {}: Setor '{}' não encontrado",
                            row.line, sector_name
                        ));
                        continue;
                    }
                }
            }
            products.push(product);
        }

        let imported = if products.is_empty() {
            0
        } else {
            self.product_service.create_many(&products, user_id).await?.len()
        };

        tracing::info!(
            "📥 Importação concluída: {} produtos, {} erros",
            imported,
            errors.len()
        );
        Ok(ImportResult { imported, errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn headers_resolve_with_aliases_and_accents() {
        assert_eq!(Column::from_header(" Preço "), Some(Column::UnitPrice));
        assert_eq!(Column::from_header("Preço Venda"), Some(Column::SalePrice));
        assert_eq!(Column::from_header("Quantity"), Some(Column::Quantity));
        assert_eq!(Column::from_header("SETOR"), Some(Column::Sector));
        assert_eq!(Column::from_header("observação"), None);
    }

    #[test]
    fn empty_name_is_reported_with_header_offset() {
        let rows = sheet(&[
            &["Nome", "Preço", "Quantidade"],
            &["Café", "2,50", "10"],
            &["", "1.00", "3"],
            &["Chá", "1.5", "4"],
        ]);
        let (parsed, errors) = parse_sheet(&rows).unwrap();
        assert_eq!(parsed.len(), 2);
        // Linha de dados 2 = linha 3 da planilha
        assert_eq!(errors, vec!["Linha 3: Nome é obrigatório".to_string()]);
        assert_eq!(parsed[0].product.unit_price, 2.5);
        assert_eq!(parsed[0].product.stock_quantity, 10);
        assert_eq!(parsed[1].line, 4);
    }

    #[test]
    fn invalid_numbers_are_row_errors() {
        let rows = sheet(&[
            &["name", "price", "quantity", "low_stock_threshold"],
            &["A", "-1", "1", ""],
            &["B", "abc", "1", ""],
            &["C", "1", "2.5", ""],
            &["D", "1", "2", ""],
        ]);
        let (parsed, errors) = parse_sheet(&rows).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].product.low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("Linha 2:"));
        assert!(errors[2].starts_with("Linha 4:"));
    }

    #[test]
    fn blank_rows_are_skipped_and_sector_is_kept_by_name() {
        let rows = sheet(&[
            &["nome", "setor"],
            &["", ""],
            &["Água", "Copa"],
        ]);
        let (parsed, errors) = parse_sheet(&rows).unwrap();
        assert!(errors.is_empty());
        assert_eq!(parsed[0].sector.as_deref(), Some("Copa"));
        assert_eq!(parsed[0].line, 3);
    }

    #[test]
    fn missing_name_column_rejects_the_file() {
        let rows = sheet(&[&["sku", "preco"], &["X1", "2"]]);
        assert!(matches!(parse_sheet(&rows), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn brazilian_number_format() {
        assert_eq!(parse_number("1.234,50"), Some(1234.5));
        assert_eq!(parse_number("R$ 3,00"), Some(3.0));
        assert_eq!(parse_number("7"), Some(7.0));
        assert_eq!(parse_number("x"), None);
    }
}
