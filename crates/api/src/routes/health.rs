//! Liveness plus a summary of which SmartWay collaborators are wired up.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Forensic enrichment model; `null` when enrichment is off.
    pub vision_model: Option<String>,
    /// Channels an emergency alert would go out on.
    pub alert_channels: Vec<&'static str>,
    pub detector_url: String,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = smartway_db::health_check(&state.pool).await.is_ok();
    if !db_healthy {
        tracing::warn!("Health check could not reach the database");
    }

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        vision_model: state.orchestrator.vision_model().map(str::to_owned),
        alert_channels: state.orchestrator.alert_channels(),
        detector_url: state.config.detector_url.clone(),
    })
}

/// Mounted at the root, outside `/api`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
