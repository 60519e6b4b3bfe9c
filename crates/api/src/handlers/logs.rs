use axum::extract::State;
use axum::Json;
use smartway_db::models::traffic_log::TrafficLogWithVideo;
use smartway_db::repositories::TrafficLogRepo;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /api/logs
pub async fn list_logs(State(state): State<AppState>) -> AppResult<Json<Vec<TrafficLogWithVideo>>> {
    let logs = TrafficLogRepo::list(&state.pool).await?;
    Ok(Json(logs))
}

/// GET /api/emergencies
///
/// Emergency logs newest first, each with its video row for location.
pub async fn list_emergencies(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<TrafficLogWithVideo>>> {
    let logs = TrafficLogRepo::list_emergencies(&state.pool).await?;
    Ok(Json(logs))
}
