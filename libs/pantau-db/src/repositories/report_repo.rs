use sqlx::SqlitePool;

use crate::error::StoreError;
use crate::models::report::{NewReport, Report};

#[derive(Clone, Debug)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a report row. Duplicate submissions produce duplicate rows;
    /// there is no idempotency key.
    pub async fn create(&self, new: &NewReport) -> Result<Report, StoreError> {
        let rec = sqlx::query_as::<_, Report>(
            "INSERT INTO reports (domain, brand, status, kategori, expired_date, catatan, api_key)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id, domain, brand, status, kategori, expired_date, catatan, api_key, reported_at",
        )
        .bind(&new.domain)
        .bind(&new.brand)
        .bind(&new.status)
        .bind(&new.kategori)
        .bind(&new.expired_date)
        .bind(&new.catatan)
        .bind(&new.api_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::fault("report insert", e))?;

        Ok(rec)
    }

    pub async fn all(&self) -> Result<Vec<Report>, StoreError> {
        sqlx::query_as::<_, Report>(
            "SELECT id, domain, brand, status, kategori, expired_date, catatan, api_key, reported_at
             FROM reports
             ORDER BY reported_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::fault("report select", e))
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM reports")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::fault("report count", e))
    }
}
