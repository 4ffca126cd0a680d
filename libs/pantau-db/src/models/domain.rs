use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

/// A managed domain record. `domain`+`brand` is deliberately NOT unique;
/// duplicate submissions create duplicate rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Domain {
    pub id: i64,
    pub domain: String,
    pub brand: String,
    pub status: String,
    pub kategori: String,
    pub expired_date: Option<String>,
    pub catatan: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct NewDomain {
    pub domain: String,
    pub brand: String,
    pub status: String,
    pub kategori: String,
    pub expired_date: Option<String>,
    pub catatan: Option<String>,
}

/// Partial update for a domain. Only the fields listed in
/// [`DomainPatch::UPDATABLE_COLUMNS`] exist here; anything else a client
/// sends is dropped at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainPatch {
    pub domain: Option<String>,
    pub brand: Option<String>,
    pub status: Option<String>,
    pub kategori: Option<String>,
    pub expired_date: Option<String>,
    pub catatan: Option<String>,
}

impl DomainPatch {
    pub const UPDATABLE_COLUMNS: [&'static str; 6] = [
        "domain",
        "brand",
        "status",
        "kategori",
        "expired_date",
        "catatan",
    ];

    pub fn is_empty(&self) -> bool {
        self.domain.is_none()
            && self.brand.is_none()
            && self.status.is_none()
            && self.kategori.is_none()
            && self.expired_date.is_none()
            && self.catatan.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub total_domains: i64,
    pub active_domains: i64,
    pub inactive_domains: i64,
    pub brand_stats: HashMap<String, i64>,
    pub today_reports: i64,
}
