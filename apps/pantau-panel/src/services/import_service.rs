use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::error::ApiError;
use crate::validator::{clean_domain, is_valid_domain, validate_table};
use pantau_db::error::StoreError;
use pantau_db::models::domain::{Domain, NewDomain};
use pantau_db::repositories::{DomainRepository, FileRepository};
use pantau_shared::api::{ImportFailure, ImportSummary};

/// Declared kind of an uploaded file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
}

impl FileKind {
    pub fn from_filename(name: &str) -> Option<FileKind> {
        let lower = name.to_lowercase();
        if lower.ends_with(".csv") {
            Some(FileKind::Csv)
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Some(FileKind::Spreadsheet)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Csv => "csv",
            FileKind::Spreadsheet => "excel",
        }
    }
}

/// A parsed upload: header names plus one string map per data row.
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub skip_invalid: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { skip_invalid: true }
    }
}

/// Encodings tried in order for CSV uploads. The first one that both
/// decodes and yields parseable CSV wins.
const CSV_ENCODINGS: [&str; 4] = ["utf-8", "latin-1", "cp1252", "iso-8859-1"];

pub fn parse_csv(bytes: &[u8]) -> Result<ParsedTable, ApiError> {
    let mut last_error = String::from("empty file");
    for encoding in CSV_ENCODINGS {
        let Some(text) = decode(bytes, encoding) else {
            last_error = format!("{}: could not decode", encoding);
            continue;
        };
        match table_from_csv(&text) {
            Ok(table) => return Ok(table),
            Err(e) => last_error = format!("{}: {}", encoding, e),
        }
    }
    Err(ApiError::Validation(format!(
        "Could not parse CSV file ({})",
        last_error
    )))
}

fn decode(bytes: &[u8], encoding: &str) -> Option<String> {
    match encoding {
        "utf-8" => std::str::from_utf8(bytes).ok().map(str::to_owned),
        // Latin-1 maps every byte, so this arm cannot fail; it terminates
        // the fallback chain in practice, same as the legacy tool.
        "latin-1" | "iso-8859-1" => Some(encoding_rs::mem::decode_latin1(bytes).into_owned()),
        "cp1252" => {
            let (text, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
            (!had_errors).then(|| text.into_owned())
        }
        _ => None,
    }
}

fn table_from_csv(text: &str) -> Result<ParsedTable, csv::Error> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = columns
            .iter()
            .cloned()
            .zip(record.iter().map(|v| v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(ParsedTable { columns, rows })
}

pub fn parse_spreadsheet(bytes: &[u8]) -> Result<ParsedTable, ApiError> {
    let cursor = std::io::Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| ApiError::Validation(format!("Could not parse spreadsheet file ({})", e)))?;

    use calamine::Reader;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ApiError::Validation("Spreadsheet contains no sheets".to_string()))?
        .map_err(|e| ApiError::Validation(format!("Could not parse spreadsheet file ({})", e)))?;

    let mut sheet_rows = range.rows();
    let header = sheet_rows
        .next()
        .ok_or_else(|| ApiError::Validation("Spreadsheet is empty".to_string()))?;
    let columns: Vec<String> = header.iter().map(cell_to_string).collect();

    let rows = sheet_rows
        .map(|row| {
            columns
                .iter()
                .cloned()
                .zip(row.iter().map(cell_to_string))
                .collect()
        })
        .collect();

    Ok(ParsedTable { columns, rows })
}

fn cell_to_string(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Synonym table applied onto canonical field names. Columns not listed
/// pass through unchanged.
pub const COLUMN_SYNONYMS: [(&str, &str); 4] = [
    ("expired_date", "expired"),
    ("expire", "expired"),
    ("notes", "catatan"),
    ("note", "catatan"),
];

pub fn normalize_columns(table: &mut ParsedTable) {
    for (from, to) in COLUMN_SYNONYMS {
        if !table.columns.iter().any(|c| c == from) {
            continue;
        }
        for col in table.columns.iter_mut() {
            if col == from {
                *col = to.to_string();
            }
        }
        for row in table.rows.iter_mut() {
            if let Some(value) = row.remove(from) {
                row.entry(to.to_string()).or_insert(value);
            }
        }
    }

    let mut seen = HashSet::new();
    table.columns.retain(|c| seen.insert(c.clone()));
}

/// Drop rows with empty domain/brand or a brand outside the whitelist.
/// Returns the number of rows removed.
pub fn filter_invalid(table: &mut ParsedTable, valid_brands: &[String]) -> usize {
    let before = table.rows.len();
    table.rows.retain(|row| {
        let domain_present = row
            .get("domain")
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        let brand = row.get("brand").map(|v| v.trim()).unwrap_or("");
        domain_present && !brand.is_empty() && valid_brands.iter().any(|b| b == brand)
    });
    before - table.rows.len()
}

/// Fill `status`/`kategori` defaults per row, overriding only genuinely
/// empty or missing values.
pub fn fill_defaults(table: &mut ParsedTable) {
    for (column, default) in [("status", "aktif"), ("kategori", "normal")] {
        if !table.columns.iter().any(|c| c == column) {
            table.columns.push(column.to_string());
        }
        for row in table.rows.iter_mut() {
            let value = row.entry(column.to_string()).or_default();
            if value.trim().is_empty() {
                *value = default.to_string();
            }
        }
    }
}

/// Bulk import: parse, validate, normalize, then submit row by row.
/// Rows go through the same gate as the submit-domain endpoint, so a bad
/// row fails individually without rolling back earlier inserts.
pub struct ImportService {
    domains: DomainRepository,
    files: FileRepository,
    valid_brands: Vec<String>,
}

impl ImportService {
    pub fn new(
        domains: DomainRepository,
        files: FileRepository,
        valid_brands: Vec<String>,
    ) -> Self {
        Self {
            domains,
            files,
            valid_brands,
        }
    }

    /// Shared write gate for the submit endpoint and each imported row.
    pub async fn submit_domain(&self, new: NewDomain) -> Result<Domain, ApiError> {
        if !is_valid_domain(&new.domain) {
            return Err(ApiError::Validation("Invalid domain format".to_string()));
        }
        if !self.valid_brands.iter().any(|b| b == &new.brand) {
            return Err(ApiError::Validation("Invalid brand".to_string()));
        }
        self.domains.create(&new).await.map_err(|e| match e {
            StoreError::Unavailable(_) => ApiError::Storage("Failed to save domain".to_string()),
            other => other.into(),
        })
    }

    pub async fn import(
        &self,
        filename: &str,
        bytes: &[u8],
        options: &ImportOptions,
        imported_by: &str,
    ) -> Result<ImportSummary, ApiError> {
        let kind = FileKind::from_filename(filename).ok_or_else(|| {
            ApiError::Validation(format!(
                "Unsupported file type: {} (expected .csv, .xlsx or .xls)",
                filename
            ))
        })?;

        let mut table = match kind {
            FileKind::Csv => parse_csv(bytes)?,
            FileKind::Spreadsheet => parse_spreadsheet(bytes)?,
        };

        let validation = validate_table(&table.columns, &table.rows, &self.valid_brands);
        if validation.is_fatal() {
            return Err(ApiError::Validation(validation.errors.join("; ")));
        }
        for warning in &validation.warnings {
            warn!("Import {}: {}", filename, warning);
        }

        let removed_count = if options.skip_invalid {
            filter_invalid(&mut table, &self.valid_brands)
        } else {
            0
        };
        normalize_columns(&mut table);
        fill_defaults(&mut table);

        let mut summary = ImportSummary {
            removed_count,
            ..Default::default()
        };

        for row in &table.rows {
            let domain = clean_domain(row.get("domain").map(String::as_str).unwrap_or(""));
            let original_note = row.get("catatan").map(|v| v.trim()).unwrap_or("");
            let new = NewDomain {
                domain: domain.clone(),
                brand: row.get("brand").map(|v| v.trim().to_string()).unwrap_or_default(),
                status: row
                    .get("status")
                    .cloned()
                    .unwrap_or_else(|| "aktif".to_string()),
                kategori: row
                    .get("kategori")
                    .cloned()
                    .unwrap_or_else(|| "normal".to_string()),
                expired_date: row
                    .get("expired")
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty()),
                catatan: Some(format!("Uploaded by {} - {}", imported_by, original_note)),
            };

            match self.submit_domain(new).await {
                Ok(_) => summary.success_count += 1,
                Err(e) => {
                    summary.error_count += 1;
                    summary.failures.push(ImportFailure {
                        domain,
                        error: e.to_string(),
                    });
                }
            }
        }

        // Upload history is best-effort; a faulted history table must not
        // retroactively fail an import that already ran.
        if let Err(e) = self
            .files
            .create(filename, kind.as_str(), bytes.len() as i64)
            .await
        {
            warn!("Failed to record upload {}: {}", filename, e);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    fn brands() -> Vec<String> {
        vec!["netpro".to_string(), "slot603".to_string()]
    }

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        pantau_db::db::create_schema(&pool).await.unwrap();
        pool
    }

    async fn service(pool: &SqlitePool) -> ImportService {
        ImportService::new(
            DomainRepository::new(pool.clone()),
            FileRepository::new(pool.clone()),
            brands(),
        )
    }

    #[test]
    fn csv_parses_utf8_with_headers() {
        let table = parse_csv(b"domain,brand\nexample.com,slot603\n").unwrap();
        assert_eq!(table.columns, vec!["domain", "brand"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0]["domain"], "example.com");
    }

    #[test]
    fn csv_falls_back_past_invalid_utf8() {
        // 0xE9 is 'é' in latin-1 but invalid as a lone UTF-8 byte.
        let bytes = b"domain,brand\ncaf\xe9.com,slot603\n";
        let table = parse_csv(bytes).unwrap();
        assert_eq!(table.rows[0]["domain"], "café.com");
    }

    #[test]
    fn unparseable_csv_names_the_last_failure() {
        // Ragged rows fail in every encoding.
        let err = parse_csv(b"domain,brand\nonly-one-field\n").unwrap_err();
        let detail = err.to_string();
        assert!(detail.contains("Could not parse CSV file"));
        assert!(detail.contains("iso-8859-1"));
    }

    #[test]
    fn synonym_columns_map_onto_canonical_names_unchanged() {
        let mut table = parse_csv(b"domain,brand,expire\na.com,slot603,2025-01-01\n").unwrap();
        normalize_columns(&mut table);
        assert!(table.columns.iter().any(|c| c == "expired"));
        assert!(!table.columns.iter().any(|c| c == "expire"));
        assert_eq!(table.rows[0]["expired"], "2025-01-01");
    }

    #[test]
    fn note_synonym_maps_to_catatan() {
        let mut table = parse_csv(b"domain,brand,notes\na.com,slot603,hello\n").unwrap();
        normalize_columns(&mut table);
        assert_eq!(table.rows[0]["catatan"], "hello");
    }

    #[test]
    fn skip_invalid_drops_rows_and_counts_them() {
        let mut table = parse_csv(
            b"domain,brand\nok.com,slot603\n,slot603\nother.com,unknownbrand\n",
        )
        .unwrap();
        let removed = filter_invalid(&mut table, &brands());
        assert_eq!(removed, 2);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0]["domain"], "ok.com");
    }

    #[test]
    fn defaults_fill_only_empty_values() {
        let mut table =
            parse_csv(b"domain,brand,status\na.com,slot603,tidak aktif\nb.com,netpro,\n").unwrap();
        fill_defaults(&mut table);
        assert_eq!(table.rows[0]["status"], "tidak aktif");
        assert_eq!(table.rows[1]["status"], "aktif");
        assert_eq!(table.rows[0]["kategori"], "normal");
        assert!(table.columns.iter().any(|c| c == "kategori"));
    }

    #[tokio::test]
    async fn import_reports_partial_success_without_rollback() {
        let pool = test_pool().await;
        let svc = service(&pool).await;

        let csv = b"domain,brand,catatan\nHTTP://WWW.Good.COM,slot603,first\nbad_domain,slot603,second\n";
        let summary = svc
            .import("upload.csv", csv, &ImportOptions::default(), "admin")
            .await
            .unwrap();

        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.removed_count, 0);
        assert_eq!(summary.failures[0].domain, "bad_domain");
        assert_eq!(summary.failures[0].error, "Invalid domain format");

        // The good row stayed committed.
        let stored = DomainRepository::new(pool.clone()).all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].domain, "good.com");
        assert_eq!(stored[0].catatan.as_deref(), Some("Uploaded by admin - first"));
    }

    #[tokio::test]
    async fn import_prefixes_notes_even_when_empty() {
        let pool = test_pool().await;
        let svc = service(&pool).await;

        let csv = b"domain,brand\nplain.com,netpro\n";
        svc.import("upload.csv", csv, &ImportOptions::default(), "user")
            .await
            .unwrap();

        let stored = DomainRepository::new(pool.clone()).all().await.unwrap();
        assert_eq!(stored[0].catatan.as_deref(), Some("Uploaded by user - "));
        assert_eq!(stored[0].status, "aktif");
        assert_eq!(stored[0].kategori, "normal");
    }

    #[tokio::test]
    async fn import_with_skip_invalid_removes_incomplete_rows() {
        let pool = test_pool().await;
        let svc = service(&pool).await;

        let csv = b"domain,brand\nkeep.com,slot603\n,netpro\n";
        let summary = svc
            .import("upload.csv", csv, &ImportOptions::default(), "admin")
            .await
            .unwrap();

        assert_eq!(summary.removed_count, 1);
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.error_count, 0);
    }

    #[tokio::test]
    async fn import_records_upload_history() {
        let pool = test_pool().await;
        let svc = service(&pool).await;

        let csv = b"domain,brand\nhist.com,slot603\n";
        svc.import("march.csv", csv, &ImportOptions::default(), "admin")
            .await
            .unwrap();

        let files = FileRepository::new(pool.clone()).all().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "march.csv");
        assert_eq!(files[0].file_type.as_deref(), Some("csv"));
        assert_eq!(files[0].file_size, Some(csv.len() as i64));
    }

    #[tokio::test]
    async fn missing_required_column_aborts_the_import() {
        let pool = test_pool().await;
        let svc = service(&pool).await;

        let err = svc
            .import(
                "broken.csv",
                b"domain\nlonely.com\n",
                &ImportOptions::default(),
                "admin",
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Missing required columns: brand"));

        // Nothing was written, including upload history.
        assert!(
            FileRepository::new(pool.clone())
                .all()
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn template_round_trips_through_the_parser() {
        let pool = test_pool().await;
        let svc = service(&pool).await;

        let template = crate::services::export_service::ExportService::template_csv().unwrap();
        let summary = svc
            .import("template_domain.csv", &template, &ImportOptions::default(), "admin")
            .await
            .unwrap();

        assert_eq!(summary.success_count, 3);
        assert_eq!(summary.error_count, 0);
    }
}
