//! Traffic log entity: the immutable audit record of one analysis save.

use serde::Serialize;
use smartway_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `traffic_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrafficLog {
    pub id: DbId,
    pub video_id: DbId,
    pub vehicle_count: i64,
    pub emergency_detected: bool,
    /// The final, merged analysis summary.
    pub analysis_data: serde_json::Value,
    /// `{ "ai_report": <narrative> }`.
    pub detailed_analysis: serde_json::Value,
    pub snapshot_url: Option<String>,
    pub signal_status: String,
    pub created_at: Timestamp,
}

/// DTO for inserting a traffic log. There is no update DTO.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTrafficLog {
    pub video_id: DbId,
    pub vehicle_count: i64,
    pub emergency_detected: bool,
    pub analysis_data: serde_json::Value,
    pub detailed_analysis: serde_json::Value,
    pub snapshot_url: Option<String>,
    pub signal_status: String,
}

/// A traffic log joined with its originating video (as a JSON object).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrafficLogWithVideo {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub log: TrafficLog,
    pub video: Option<serde_json::Value>,
}
