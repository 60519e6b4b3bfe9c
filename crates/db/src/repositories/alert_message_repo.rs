//! Repository for the append-only `alert_messages` table.

use sqlx::PgPool;

use crate::models::alert_message::{AlertMessage, AlertMessageWithVideo, CreateAlertMessage};

/// Column list for `alert_messages` queries.
const COLUMNS: &str = "id, video_id, type, message, recipient, delivery_status, created_at";

pub struct AlertMessageRepo;

impl AlertMessageRepo {
    /// Append a new alert record.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAlertMessage,
    ) -> Result<AlertMessage, sqlx::Error> {
        let query = format!(
            "INSERT INTO alert_messages (video_id, type, message, recipient, delivery_status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlertMessage>(&query)
            .bind(input.video_id)
            .bind(&input.alert_type)
            .bind(&input.message)
            .bind(&input.recipient)
            .bind(&input.delivery_status)
            .fetch_one(pool)
            .await
    }

    /// All alerts joined with their video, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<AlertMessageWithVideo>, sqlx::Error> {
        sqlx::query_as::<_, AlertMessageWithVideo>(
            "SELECT a.id, a.video_id, a.type, a.message, a.recipient, a.delivery_status, \
                    a.created_at, to_jsonb(v) AS video \
             FROM alert_messages a LEFT JOIN videos v ON v.id = a.video_id \
             ORDER BY a.created_at DESC, a.id DESC",
        )
        .fetch_all(pool)
        .await
    }
}
