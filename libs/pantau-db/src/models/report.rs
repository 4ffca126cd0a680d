use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An externally submitted observation about a domain. Append-only and
/// never joined against the managed `domains` table by the store layer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: i64,
    pub domain: String,
    pub brand: String,
    pub status: Option<String>,
    pub kategori: Option<String>,
    pub expired_date: Option<String>,
    pub catatan: Option<String>,
    pub api_key: Option<String>,
    pub reported_at: chrono::NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct NewReport {
    pub domain: String,
    pub brand: String,
    pub status: Option<String>,
    pub kategori: Option<String>,
    pub expired_date: Option<String>,
    pub catatan: Option<String>,
    pub api_key: Option<String>,
}
