pub mod health;
pub mod history;
pub mod video;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /videos                      list, upload
/// /videos/{id}                 delete
/// /videos/{id}/analysis        save analysis (enrich, log, alert)
///
/// /logs                        traffic log history
/// /emergencies                 emergency logs with video location
/// /alerts                      alert records with video location
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/videos", video::router())
        .merge(history::router())
}
