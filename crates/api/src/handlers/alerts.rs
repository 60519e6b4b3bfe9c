use axum::extract::State;
use axum::Json;
use smartway_db::models::alert_message::AlertMessageWithVideo;
use smartway_db::repositories::AlertMessageRepo;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /api/alerts
pub async fn list_alerts(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AlertMessageWithVideo>>> {
    let alerts = AlertMessageRepo::list(&state.pool).await?;
    Ok(Json(alerts))
}
