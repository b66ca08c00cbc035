use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::dataset::DatasetStore;

#[derive(Clone)]
pub struct HealthState {
    pub dataset: DatasetStore,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Whether the service is running
    pub healthy: bool,
    /// Number of street segments in the current snapshot
    pub segment_count: usize,
    /// Number of sweeping rules in the current snapshot
    pub rule_count: usize,
    /// Source rows skipped during the last load (malformed geometry/fields)
    pub skipped_rows: usize,
    /// When the current snapshot was loaded (RFC 3339)
    pub dataset_loaded_at: String,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    let snapshot = state.dataset.read().await.clone();

    Json(HealthResponse {
        healthy: true,
        segment_count: snapshot.segments.len(),
        rule_count: snapshot.rule_count(),
        skipped_rows: snapshot.skipped_rows,
        dataset_loaded_at: snapshot.loaded_at.to_rfc3339(),
    })
}

pub fn router(dataset: DatasetStore) -> Router {
    let state = HealthState { dataset };
    Router::new()
        .route("/", get(health_check))
        .with_state(state)
}
