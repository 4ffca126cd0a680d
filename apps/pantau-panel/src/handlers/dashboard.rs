use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde_json::{Value, json};

use crate::AppState;
use crate::error::ApiError;

/// GET /api/dashboard/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let stats = state.domains.stats().await?;
    Ok(Json(json!({
        "stats": stats,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
