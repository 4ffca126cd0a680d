use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;

use crate::AppState;
use crate::error::ApiError;
use crate::validator::is_valid_domain;
use pantau_db::error::StoreError;
use pantau_db::models::report::NewReport;
use pantau_shared::api::ReportSubmission;

/// POST /api/report — external write path, authenticated by the brand's
/// API key. Duplicate submissions append duplicate rows by design.
pub async fn receive_report(
    State(state): State<AppState>,
    Json(report): Json<ReportSubmission>,
) -> Result<Json<Value>, ApiError> {
    let expected = state.config.key_for_brand(&report.brand);
    if expected != Some(report.api_key.as_str()) {
        return Err(ApiError::Auth("Invalid API key".to_string()));
    }

    if !is_valid_domain(&report.domain) {
        return Err(ApiError::Validation("Invalid domain format".to_string()));
    }

    let new = NewReport {
        domain: report.domain.clone(),
        brand: report.brand.clone(),
        status: Some(report.status),
        kategori: Some(report.kategori),
        expired_date: report.expired,
        catatan: report.catatan,
        api_key: Some(report.api_key),
    };
    state.reports.create(&new).await.map_err(|e| match e {
        StoreError::Unavailable(_) => ApiError::Storage("Failed to save report".to_string()),
        other => other.into(),
    })?;

    info!("Report received for {} ({})", report.domain, report.brand);

    Ok(Json(json!({
        "message": "Report received successfully",
        "domain": report.domain,
        "brand": report.brand,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// GET /api/reports
pub async fn list_reports(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let reports = state.reports.all().await?;
    let count = reports.len();
    Ok(Json(json!({
        "reports": reports,
        "count": count,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::state_with_temp_store;

    fn submission(api_key: &str, domain: &str) -> ReportSubmission {
        ReportSubmission {
            domain: domain.to_string(),
            brand: "slot603".to_string(),
            status: "aktif".to_string(),
            kategori: "normal".to_string(),
            expired: None,
            catatan: Some("seen in the wild".to_string()),
            api_key: api_key.to_string(),
        }
    }

    #[tokio::test]
    async fn mismatched_api_key_is_rejected_without_a_row() {
        let (_dir, state) = state_with_temp_store().await;

        let err = receive_report(State(state.clone()), Json(submission("WRONG-KEY", "a.com")))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid API key");
        assert!(matches!(err, ApiError::Auth(_)));
        assert_eq!(state.reports.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn key_for_another_brand_does_not_authenticate() {
        let (_dir, state) = state_with_temp_store().await;

        // A valid netpro key must not authorize a slot603 report.
        let err = receive_report(State(state.clone()), Json(submission("NETPRO-KEY", "a.com")))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Auth(_)));
        assert_eq!(state.reports.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_domain_is_a_validation_error() {
        let (_dir, state) = state_with_temp_store().await;

        let err = receive_report(
            State(state.clone()),
            Json(submission("SLOT603-KEY", "no_tld")),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(state.reports.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn valid_report_is_persisted_and_echoed() {
        let (_dir, state) = state_with_temp_store().await;

        let response = receive_report(
            State(state.clone()),
            Json(submission("SLOT603-KEY", "agent.example.com")),
        )
        .await
        .unwrap();

        assert_eq!(response.0["domain"], "agent.example.com");
        assert_eq!(response.0["brand"], "slot603");

        let stored = state.reports.all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].api_key.as_deref(), Some("SLOT603-KEY"));
        assert_eq!(stored[0].status.as_deref(), Some("aktif"));
    }

    #[tokio::test]
    async fn duplicate_reports_append_duplicate_rows() {
        let (_dir, state) = state_with_temp_store().await;

        for _ in 0..2 {
            receive_report(
                State(state.clone()),
                Json(submission("SLOT603-KEY", "dup.example.com")),
            )
            .await
            .unwrap();
        }

        assert_eq!(state.reports.count().await.unwrap(), 2);
    }
}
