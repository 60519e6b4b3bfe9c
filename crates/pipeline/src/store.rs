//! Persistence seam of the orchestrator.

use async_trait::async_trait;
use serde_json::Value;
use smartway_core::types::DbId;
use smartway_db::models::alert_message::{AlertMessage, CreateAlertMessage};
use smartway_db::models::traffic_log::{CreateTrafficLog, TrafficLog};
use smartway_db::models::video::Video;
use smartway_db::repositories::{AlertMessageRepo, TrafficLogRepo, VideoRepo};
use smartway_db::DbPool;

/// The three writes an analysis save performs, in order.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Set status and summary. `None` when the video does not exist.
    async fn update_analysis(
        &self,
        video_id: DbId,
        status: &str,
        summary: &Value,
    ) -> Result<Option<Video>, sqlx::Error>;

    async fn insert_traffic_log(&self, log: &CreateTrafficLog) -> Result<TrafficLog, sqlx::Error>;

    async fn insert_alert(&self, alert: &CreateAlertMessage) -> Result<AlertMessage, sqlx::Error>;
}

/// [`AnalysisStore`] backed by the Postgres repositories.
#[derive(Clone)]
pub struct PgAnalysisStore {
    pool: DbPool,
}

impl PgAnalysisStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalysisStore for PgAnalysisStore {
    async fn update_analysis(
        &self,
        video_id: DbId,
        status: &str,
        summary: &Value,
    ) -> Result<Option<Video>, sqlx::Error> {
        VideoRepo::update_analysis(&self.pool, video_id, status, summary).await
    }

    async fn insert_traffic_log(&self, log: &CreateTrafficLog) -> Result<TrafficLog, sqlx::Error> {
        TrafficLogRepo::create(&self.pool, log).await
    }

    async fn insert_alert(&self, alert: &CreateAlertMessage) -> Result<AlertMessage, sqlx::Error> {
        AlertMessageRepo::create(&self.pool, alert).await
    }
}
