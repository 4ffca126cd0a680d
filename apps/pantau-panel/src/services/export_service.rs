use rust_xlsxwriter::Workbook;

use crate::error::ApiError;
use pantau_db::models::domain::Domain;
use pantau_db::repositories::DomainRepository;

pub const EXPORT_COLUMNS: [&str; 6] = [
    "domain",
    "brand",
    "status",
    "kategori",
    "expired_date",
    "catatan",
];

/// Sample rows offered as a download so operators have a known-good file
/// to start from.
const TEMPLATE_ROWS: [[&str; 6]; 3] = [
    [
        "example1.com",
        "slot603",
        "aktif",
        "normal",
        "2025-12-31",
        "Contoh domain 1",
    ],
    [
        "example2.com",
        "netpro",
        "aktif",
        "premium",
        "2025-11-30",
        "Contoh domain 2",
    ],
    [
        "example3.com",
        "slot603",
        "tidak aktif",
        "normal",
        "2025-10-15",
        "Contoh domain 3",
    ],
];

/// Tabular exports of the domain inventory (CSV and single-sheet xlsx).
pub struct ExportService {
    domains: DomainRepository,
}

impl ExportService {
    pub fn new(domains: DomainRepository) -> Self {
        Self { domains }
    }

    pub async fn domains_csv(&self) -> Result<Vec<u8>, ApiError> {
        let rows = self.domains.all().await?;
        csv_bytes(rows.iter().map(domain_cells))
    }

    pub async fn domains_xlsx(&self) -> Result<Vec<u8>, ApiError> {
        let rows = self.domains.all().await?;
        let cells: Vec<[String; 6]> = rows.iter().map(domain_cells).collect();
        xlsx_bytes(&cells)
    }

    pub fn template_csv() -> Result<Vec<u8>, ApiError> {
        csv_bytes(template_cells().into_iter())
    }

    pub fn template_xlsx() -> Result<Vec<u8>, ApiError> {
        xlsx_bytes(&template_cells())
    }
}

fn template_cells() -> Vec<[String; 6]> {
    TEMPLATE_ROWS
        .iter()
        .map(|row| row.map(str::to_string))
        .collect()
}

fn domain_cells(d: &Domain) -> [String; 6] {
    [
        d.domain.clone(),
        d.brand.clone(),
        d.status.clone(),
        d.kategori.clone(),
        d.expired_date.clone().unwrap_or_default(),
        d.catatan.clone().unwrap_or_default(),
    ]
}

fn csv_bytes(rows: impl Iterator<Item = [String; 6]>) -> Result<Vec<u8>, ApiError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(EXPORT_COLUMNS)
        .map_err(export_failed)?;
    for row in rows {
        writer.write_record(&row).map_err(export_failed)?;
    }
    writer
        .into_inner()
        .map_err(|e| ApiError::Storage(format!("CSV export failed: {}", e)))
}

fn xlsx_bytes(rows: &[[String; 6]]) -> Result<Vec<u8>, ApiError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Domains").map_err(xlsx_failed)?;

    for (col, name) in EXPORT_COLUMNS.iter().enumerate() {
        sheet
            .write_string(0, col as u16, *name)
            .map_err(xlsx_failed)?;
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            sheet
                .write_string((r + 1) as u32, c as u16, value)
                .map_err(xlsx_failed)?;
        }
    }

    workbook.save_to_buffer().map_err(xlsx_failed)
}

fn export_failed(e: csv::Error) -> ApiError {
    ApiError::Storage(format!("CSV export failed: {}", e))
}

fn xlsx_failed(e: rust_xlsxwriter::XlsxError) -> ApiError {
    ApiError::Storage(format!("Excel export failed: {}", e))
}
