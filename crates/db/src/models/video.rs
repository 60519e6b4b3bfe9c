//! Uploaded traffic-camera video entity.

use serde::Serialize;
use smartway_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Video {
    pub id: DbId,
    /// Original file name shown in the dashboard.
    pub filename: String,
    /// Stored file name inside the upload directory.
    pub filepath: String,
    pub size_bytes: i64,
    pub status: String,
    pub analysis_summary: Option<serde_json::Value>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
    pub road_name: Option<String>,
    /// Alert recipient for incidents detected in this video.
    pub email: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a freshly uploaded video.
#[derive(Debug, Clone, Default)]
pub struct CreateVideo {
    pub filename: String,
    pub filepath: String,
    pub size_bytes: i64,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
    pub road_name: Option<String>,
    pub email: Option<String>,
}
