use axum::Json;
use axum::extract::State;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::AppState;
use crate::error::ApiError;
use pantau_db::models::domain::Domain;

/// Chart-ready label/value pairs, most frequent first.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<i64>,
}

/// Domains created per calendar day, ascending.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct TimelineSeries {
    pub dates: Vec<String>,
    pub counts: Vec<i64>,
}

fn count_by(domains: &[Domain], key: impl Fn(&Domain) -> &str) -> ChartSeries {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for d in domains {
        *counts.entry(key(d).to_string()).or_default() += 1;
    }

    let mut pairs: Vec<(String, i64)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    ChartSeries {
        labels: pairs.iter().map(|(label, _)| label.clone()).collect(),
        values: pairs.iter().map(|(_, count)| *count).collect(),
    }
}

pub fn status_series(domains: &[Domain]) -> ChartSeries {
    count_by(domains, |d| d.status.as_str())
}

pub fn brand_series(domains: &[Domain]) -> ChartSeries {
    count_by(domains, |d| d.brand.as_str())
}

pub fn timeline_series(domains: &[Domain]) -> TimelineSeries {
    let mut per_day: BTreeMap<String, i64> = BTreeMap::new();
    for d in domains {
        *per_day.entry(d.created_at.date().to_string()).or_default() += 1;
    }

    TimelineSeries {
        dates: per_day.keys().cloned().collect(),
        counts: per_day.values().copied().collect(),
    }
}

/// GET /api/charts/status
pub async fn status_chart(State(state): State<AppState>) -> Result<Json<ChartSeries>, ApiError> {
    let domains = state.domains.all().await?;
    Ok(Json(status_series(&domains)))
}

/// GET /api/charts/brands
pub async fn brand_chart(State(state): State<AppState>) -> Result<Json<ChartSeries>, ApiError> {
    let domains = state.domains.all().await?;
    Ok(Json(brand_series(&domains)))
}

/// GET /api/charts/timeline
pub async fn timeline_chart(
    State(state): State<AppState>,
) -> Result<Json<TimelineSeries>, ApiError> {
    let domains = state.domains.all().await?;
    Ok(Json(timeline_series(&domains)))
}
