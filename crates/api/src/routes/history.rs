//! Read-only history of traffic logs and dispatched alerts.
//!
//! ```text
//! GET /logs           list_logs
//! GET /emergencies    list_emergencies
//! GET /alerts         list_alerts
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::{alerts, logs};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/logs", get(logs::list_logs))
        .route("/emergencies", get(logs::list_emergencies))
        .route("/alerts", get(alerts::list_alerts))
}
