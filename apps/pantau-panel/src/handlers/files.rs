use axum::Json;
use axum::extract::{Multipart, State};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;

use crate::AppState;
use crate::error::ApiError;
use crate::handlers::auth::current_session;
use crate::services::import_service::ImportOptions;
use pantau_shared::api::ImportSummary;

/// POST /api/import — multipart bulk import. Requires a live session:
/// the importing user becomes the note prefix on every row.
pub async fn import_file(
    State(state): State<AppState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, ApiError> {
    let session =
        current_session(&state, &jar).ok_or_else(|| ApiError::Auth("Login required".to_string()))?;

    let mut filename: Option<String> = None;
    let mut bytes: Option<Vec<u8>> = None;
    let mut skip_invalid = true;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                filename = field.file_name().map(str::to_owned);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Failed to read upload: {}", e)))?;
                bytes = Some(data.to_vec());
            }
            Some("skip_invalid") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Failed to read field: {}", e)))?;
                skip_invalid = text.trim() != "false";
            }
            _ => {}
        }
    }

    let filename =
        filename.ok_or_else(|| ApiError::Validation("Missing 'file' field".to_string()))?;
    let bytes = bytes.ok_or_else(|| ApiError::Validation("Missing 'file' field".to_string()))?;

    info!(
        "Import of {} ({} bytes) started by {} ({})",
        filename,
        bytes.len(),
        session.username,
        session.role
    );

    let summary = state
        .import
        .import(&filename, &bytes, &ImportOptions { skip_invalid }, &session.username)
        .await?;

    info!(
        "Import of {} finished: {} ok, {} failed, {} skipped",
        filename, summary.success_count, summary.error_count, summary.removed_count
    );

    Ok(Json(summary))
}

/// GET /api/files — upload history, newest first.
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let files = state.files.all().await?;
    let count = files.len();
    Ok(Json(json!({
        "files": files,
        "count": count,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
