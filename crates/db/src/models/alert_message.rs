//! Alert message entity: one row per emergency dispatch.

use serde::Serialize;
use smartway_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `alert_messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertMessage {
    pub id: DbId,
    pub video_id: DbId,
    /// `Emergency` or `Congestion`.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub alert_type: String,
    pub message: String,
    pub recipient: Option<String>,
    /// `sent`, `partial`, `failed`, or `skipped`.
    pub delivery_status: String,
    pub created_at: Timestamp,
}

/// DTO for appending an alert message.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAlertMessage {
    pub video_id: DbId,
    pub alert_type: String,
    pub message: String,
    pub recipient: Option<String>,
    pub delivery_status: String,
}

/// An alert message joined with its originating video (as a JSON object).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertMessageWithVideo {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub alert: AlertMessage,
    pub video: Option<serde_json::Value>,
}
