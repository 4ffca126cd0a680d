use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde_json::{Value, json};
use tracing::error;

use crate::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Pantau Domain Monitor API",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /health — liveness plus a real database round trip.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.pool)
        .await
    {
        Ok(_) => "connected",
        Err(e) => {
            error!("Health check database probe failed: {}", e);
            "error"
        }
    };

    Json(json!({
        "status": if database == "connected" { "healthy" } else { "degraded" },
        "database": database,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
