//! Route definitions for uploaded videos.
//!
//! Mounted at `/videos`.
//!
//! ```text
//! GET    /                  list_videos
//! POST   /                  upload_video
//! DELETE /{id}              delete_video
//! PUT    /{id}/analysis     save_analysis
//! ```

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, put};
use axum::Router;

use crate::handlers::video;
use crate::state::AppState;

/// Camera clips are far larger than axum's default 2 MB body limit.
const MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(video::list_videos)
                .post(video::upload_video)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/{id}", delete(video::delete_video))
        .route("/{id}/analysis", put(video::save_analysis))
}
