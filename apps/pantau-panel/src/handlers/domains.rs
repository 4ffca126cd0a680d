use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::{Value, json};

use crate::AppState;
use crate::error::ApiError;
use crate::services::export_service::ExportService;
use crate::validator::is_valid_domain;
use pantau_db::models::domain::{DomainPatch, NewDomain};
use pantau_shared::api::DomainSubmission;

/// POST /api/submit-domain — internal write path (dashboard and importer).
pub async fn submit_domain(
    State(state): State<AppState>,
    Json(submission): Json<DomainSubmission>,
) -> Result<Json<Value>, ApiError> {
    let new = NewDomain {
        domain: submission.domain.clone(),
        brand: submission.brand.clone(),
        status: submission.status.unwrap_or_else(|| "aktif".to_string()),
        kategori: submission.kategori.unwrap_or_else(|| "normal".to_string()),
        expired_date: submission.expired,
        catatan: submission.catatan,
    };
    state.import.submit_domain(new).await?;

    Ok(Json(json!({
        "message": "Domain berhasil ditambahkan",
        "domain": submission.domain,
        "brand": submission.brand,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// GET /api/domains
pub async fn list_domains(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let domains = state.domains.all().await?;
    let count = domains.len();
    Ok(Json(json!({
        "domains": domains,
        "count": count,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// PUT /api/domains/{id} — partial update; unknown fields never reach
/// here because the patch type only deserializes the updatable columns.
pub async fn update_domain(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<DomainPatch>,
) -> Result<Json<Value>, ApiError> {
    state.domains.update(id, &patch).await?;

    Ok(Json(json!({
        "message": "Domain updated successfully",
        "domain_id": id,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// DELETE /api/domains/{id}
pub async fn delete_domain(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.domains.delete(id).await?;

    Ok(Json(json!({
        "message": "Domain deleted successfully",
        "domain_id": id,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// GET /api/domain-check/{domain}
pub async fn check_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !is_valid_domain(&domain) {
        return Err(ApiError::Validation("Invalid domain format".to_string()));
    }

    let status_info = state.probe.check(&domain).await;
    Ok(Json(json!({
        "domain": domain,
        "status_info": status_info,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

const CSV_CONTENT_TYPE: &str = "text/csv";
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn file_download(filename: &str, content_type: &str, bytes: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
}

/// GET /api/export/domains.csv
pub async fn export_csv(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.export.domains_csv().await?;
    Ok(file_download("domains.csv", CSV_CONTENT_TYPE, bytes))
}

/// GET /api/export/domains.xlsx
pub async fn export_xlsx(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.export.domains_xlsx().await?;
    Ok(file_download("domains.xlsx", XLSX_CONTENT_TYPE, bytes))
}

/// GET /api/export/template.csv
pub async fn template_csv() -> Result<impl IntoResponse, ApiError> {
    let bytes = ExportService::template_csv()?;
    Ok(file_download("template_domain.csv", CSV_CONTENT_TYPE, bytes))
}

/// GET /api/export/template.xlsx
pub async fn template_xlsx() -> Result<impl IntoResponse, ApiError> {
    let bytes = ExportService::template_xlsx()?;
    Ok(file_download(
        "template_domain.xlsx",
        XLSX_CONTENT_TYPE,
        bytes,
    ))
}
