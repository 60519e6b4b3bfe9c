//! Repository for the `videos` table.

use smartway_core::types::DbId;
use smartway_core::video_status::VIDEO_STATUS_PROCESSING;
use sqlx::PgPool;

use crate::models::video::{CreateVideo, Video};

/// Column list for `videos` queries.
const COLUMNS: &str = "id, filename, filepath, size_bytes, status, analysis_summary, \
    address_line, city, state, country, pincode, road_name, email, created_at, updated_at";

/// Provides CRUD operations for uploaded videos.
pub struct VideoRepo;

impl VideoRepo {
    /// Insert a new video in `processing` state.
    pub async fn create(pool: &PgPool, input: &CreateVideo) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos \
                (filename, filepath, size_bytes, status, address_line, city, state, \
                 country, pincode, road_name, email) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(&input.filename)
            .bind(&input.filepath)
            .bind(input.size_bytes)
            .bind(VIDEO_STATUS_PROCESSING)
            .bind(&input.address_line)
            .bind(&input.city)
            .bind(&input.state)
            .bind(&input.country)
            .bind(&input.pincode)
            .bind(&input.road_name)
            .bind(&input.email)
            .fetch_one(pool)
            .await
    }

    /// Find a video by primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all videos, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Video>(&query).fetch_all(pool).await
    }

    /// Set the status and analysis summary in one statement.
    ///
    /// Returns `None` if no video with the given id exists.
    pub async fn update_analysis(
        pool: &PgPool,
        id: DbId,
        status: &str,
        analysis_summary: &serde_json::Value,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET status = $2, analysis_summary = $3, updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(status)
            .bind(analysis_summary)
            .fetch_optional(pool)
            .await
    }

    /// Change only the status. Returns `true` if a row was updated.
    pub async fn set_status(pool: &PgPool, id: DbId, status: &str) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE videos SET status = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a video, returning the deleted row so the caller can remove
    /// the stored file. Logs and alerts cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("DELETE FROM videos WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
