use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UploadedFile {
    pub id: i64,
    pub filename: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub uploaded_at: chrono::NaiveDateTime,
    pub status: String,
}
