use sqlx::SqlitePool;

use crate::error::StoreError;
use crate::models::domain::{DashboardStats, Domain, DomainPatch, NewDomain};

#[derive(Clone, Debug)]
pub struct DomainRepository {
    pool: SqlitePool,
}

impl DomainRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: &NewDomain) -> Result<Domain, StoreError> {
        let rec = sqlx::query_as::<_, Domain>(
            "INSERT INTO domains (domain, brand, status, kategori, expired_date, catatan)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, domain, brand, status, kategori, expired_date, catatan, created_at, updated_at",
        )
        .bind(&new.domain)
        .bind(&new.brand)
        .bind(&new.status)
        .bind(&new.kategori)
        .bind(&new.expired_date)
        .bind(&new.catatan)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::fault("domain insert", e))?;

        Ok(rec)
    }

    /// All domains, newest created first.
    pub async fn all(&self) -> Result<Vec<Domain>, StoreError> {
        sqlx::query_as::<_, Domain>(
            "SELECT id, domain, brand, status, kategori, expired_date, catatan, created_at, updated_at
             FROM domains
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::fault("domain select", e))
    }

    /// Apply a partial update. Fields left `None` keep their stored value;
    /// a patch with nothing set is rejected before touching the store.
    pub async fn update(&self, id: i64, patch: &DomainPatch) -> Result<Domain, StoreError> {
        if patch.is_empty() {
            return Err(StoreError::EmptyUpdate);
        }

        // SET clause is generated from the updatable-column whitelist; the
        // bind order below must follow it.
        let set_clause: Vec<String> = DomainPatch::UPDATABLE_COLUMNS
            .iter()
            .map(|col| format!("{col} = COALESCE(?, {col})"))
            .collect();
        let sql = format!(
            "UPDATE domains SET {}, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            set_clause.join(", ")
        );

        let result = sqlx::query(&sql)
            .bind(&patch.domain)
            .bind(&patch.brand)
            .bind(&patch.status)
            .bind(&patch.kategori)
            .bind(&patch.expired_date)
            .bind(&patch.catatan)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::fault("domain update", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        let rec = sqlx::query_as::<_, Domain>(
            "SELECT id, domain, brand, status, kategori, expired_date, catatan, created_at, updated_at
             FROM domains WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::fault("domain reload", e))?;

        Ok(rec)
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM domains WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::fault("domain delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<DashboardStats, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM domains")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::fault("stats total", e))?;

        let active: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM domains WHERE status = 'aktif'")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::fault("stats active", e))?;

        let brand_rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT brand, COUNT(*) FROM domains GROUP BY brand")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::fault("stats brands", e))?;

        let today_reports: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reports WHERE date(reported_at) = date('now')",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::fault("stats reports", e))?;

        Ok(DashboardStats {
            total_domains: total,
            active_domains: active,
            inactive_domains: total - active,
            brand_stats: brand_rows.into_iter().collect(),
            today_reports,
        })
    }
}
