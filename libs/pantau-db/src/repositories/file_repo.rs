use sqlx::SqlitePool;

use crate::error::StoreError;
use crate::models::uploaded_file::UploadedFile;

#[derive(Clone, Debug)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        filename: &str,
        file_type: &str,
        file_size: i64,
    ) -> Result<UploadedFile, StoreError> {
        let rec = sqlx::query_as::<_, UploadedFile>(
            "INSERT INTO uploaded_files (filename, file_type, file_size)
             VALUES (?, ?, ?)
             RETURNING id, filename, file_type, file_size, uploaded_at, status",
        )
        .bind(filename)
        .bind(file_type)
        .bind(file_size)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::fault("uploaded_file insert", e))?;

        Ok(rec)
    }

    pub async fn all(&self) -> Result<Vec<UploadedFile>, StoreError> {
        sqlx::query_as::<_, UploadedFile>(
            "SELECT id, filename, file_type, file_size, uploaded_at, status
             FROM uploaded_files
             ORDER BY uploaded_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::fault("uploaded_file select", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::create_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn upload_history_records_roundtrip() {
        let repo = FileRepository::new(test_pool().await);
        repo.create("domains.csv", "csv", 2048).await.unwrap();

        let all = repo.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].filename, "domains.csv");
        assert_eq!(all[0].file_type.as_deref(), Some("csv"));
        assert_eq!(all[0].file_size, Some(2048));
        assert_eq!(all[0].status, "processed");
    }
}
