//! Repository for the append-only `traffic_logs` table.

use sqlx::PgPool;

use crate::models::traffic_log::{CreateTrafficLog, TrafficLog, TrafficLogWithVideo};

/// Column list for `traffic_logs` queries.
const COLUMNS: &str = "id, video_id, vehicle_count, emergency_detected, analysis_data, \
    detailed_analysis, snapshot_url, signal_status, created_at";

/// Same columns, qualified with the `l` alias for joins.
const JOINED_COLUMNS: &str = "l.id, l.video_id, l.vehicle_count, l.emergency_detected, \
    l.analysis_data, l.detailed_analysis, l.snapshot_url, l.signal_status, l.created_at, \
    to_jsonb(v) AS video";

/// Insert and read operations for traffic logs. Rows are never updated.
pub struct TrafficLogRepo;

impl TrafficLogRepo {
    /// Append a new log row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTrafficLog,
    ) -> Result<TrafficLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO traffic_logs \
                (video_id, vehicle_count, emergency_detected, analysis_data, \
                 detailed_analysis, snapshot_url, signal_status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrafficLog>(&query)
            .bind(input.video_id)
            .bind(input.vehicle_count)
            .bind(input.emergency_detected)
            .bind(&input.analysis_data)
            .bind(&input.detailed_analysis)
            .bind(&input.snapshot_url)
            .bind(&input.signal_status)
            .fetch_one(pool)
            .await
    }

    /// Full history joined with the originating video, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<TrafficLogWithVideo>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} \
             FROM traffic_logs l LEFT JOIN videos v ON v.id = l.video_id \
             ORDER BY l.created_at DESC, l.id DESC"
        );
        sqlx::query_as::<_, TrafficLogWithVideo>(&query)
            .fetch_all(pool)
            .await
    }

    /// Logs flagged as emergencies, joined with the video for location.
    pub async fn list_emergencies(
        pool: &PgPool,
    ) -> Result<Vec<TrafficLogWithVideo>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} \
             FROM traffic_logs l LEFT JOIN videos v ON v.id = l.video_id \
             WHERE l.emergency_detected \
             ORDER BY l.created_at DESC, l.id DESC"
        );
        sqlx::query_as::<_, TrafficLogWithVideo>(&query)
            .fetch_all(pool)
            .await
    }
}
