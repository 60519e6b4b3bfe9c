//! Handlers for the `/videos` resource: upload, listing, deletion, and the
//! analysis save that drives enrichment and alerting.

use std::path::{Path as FsPath, PathBuf};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;
use smartway_core::classification::IncidentClassification;
use smartway_core::error::CoreError;
use smartway_core::types::DbId;
use smartway_core::video_status::{VIDEO_STATUS_ANALYSIS_FAILED, VIDEO_STATUS_PROCESSED};
use smartway_db::models::video::{CreateVideo, Video};
use smartway_db::repositories::VideoRepo;
use smartway_events::ChannelDelivery;
use smartway_pipeline::SaveAnalysisRequest;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const MSG_UPLOAD_ANALYZED: &str = "Video uploaded and analyzed";
pub const MSG_UPLOAD_ANALYSIS_FAILED: &str = "Video uploaded but analysis failed";
pub const MSG_VIDEO_DELETED: &str = "Video deleted";
pub const MSG_ANALYSIS_SAVED: &str = "Analysis updated and logged";

/// Multipart field carrying the video file.
const FILE_FIELD: &str = "video";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub video: Video,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SaveAnalysisResponse {
    pub message: &'static str,
    pub video: Video,
    pub ai_report: String,
    pub classification: IncidentClassification,
    pub deliveries: Vec<ChannelDelivery>,
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// Stored file plus the address fields sent alongside it.
#[derive(Debug, Default)]
struct UploadForm {
    original_name: Option<String>,
    stored_name: Option<String>,
    size_bytes: i64,
    address_line: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    pincode: Option<String>,
    road_name: Option<String>,
    email: Option<String>,
}

impl UploadForm {
    fn set_text(&mut self, name: &str, value: String) {
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match name {
            "address_line" => self.address_line = value,
            "city" => self.city = value,
            "state" => self.state = value,
            "country" => self.country = value,
            "pincode" => self.pincode = value,
            "road_name" => self.road_name = value,
            "email" => self.email = value,
            other => tracing::debug!(field = other, "Ignoring unknown upload field"),
        }
    }
}

/// POST /api/videos
///
/// Store the file, record it as `processing`, then ask the detector for a
/// summary. A detector failure is reported in the message, not as an error;
/// the file is kept so analysis can be retried.
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let upload_dir = &state.config.upload_dir;
    let mut form = UploadForm::default();

    if let Err(e) = read_upload_form(&mut multipart, upload_dir, &mut form).await {
        if let Some(stored) = &form.stored_name {
            remove_stored_file(upload_dir, stored).await;
        }
        return Err(e);
    }

    let (Some(original_name), Some(stored_name)) =
        (form.original_name.take(), form.stored_name.take())
    else {
        return Err(AppError::BadRequest("No file uploaded".to_string()));
    };

    let input = CreateVideo {
        filename: original_name,
        filepath: stored_name,
        size_bytes: form.size_bytes,
        address_line: form.address_line,
        city: form.city,
        state: form.state,
        country: form.country,
        pincode: form.pincode,
        road_name: form.road_name,
        email: form.email,
    };

    let video = match VideoRepo::create(&state.pool, &input).await {
        Ok(video) => video,
        Err(e) => {
            remove_stored_file(upload_dir, &input.filepath).await;
            return Err(e.into());
        }
    };
    tracing::info!(
        video_id = video.id,
        filename = %video.filename,
        size_bytes = video.size_bytes,
        "Video uploaded"
    );

    let analyzed = match state.detector.process_video(&video.filepath).await {
        Ok(response) if response.is_success() => {
            let summary = response.summary.unwrap_or_default();
            VideoRepo::update_analysis(&state.pool, video.id, VIDEO_STATUS_PROCESSED, &summary)
                .await?
        }
        Ok(response) => {
            tracing::warn!(
                video_id = video.id,
                status = %response.status,
                "Detector did not succeed"
            );
            None
        }
        Err(e) => {
            tracing::error!(video_id = video.id, error = %e, "Video analysis failed");
            None
        }
    };

    let (message, video) = match analyzed {
        Some(updated) => (MSG_UPLOAD_ANALYZED, updated),
        None => {
            VideoRepo::set_status(&state.pool, video.id, VIDEO_STATUS_ANALYSIS_FAILED).await?;
            let current = VideoRepo::find_by_id(&state.pool, video.id)
                .await?
                .unwrap_or(video);
            (MSG_UPLOAD_ANALYSIS_FAILED, current)
        }
    };

    Ok(Json(UploadResponse { message, video }))
}

/// Walk the multipart body, streaming the video to disk under a generated
/// name and collecting the text fields.
async fn read_upload_form(
    multipart: &mut Multipart,
    upload_dir: &FsPath,
    form: &mut UploadForm,
) -> AppResult<()> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name != FILE_FIELD {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.set_text(&name, value);
            continue;
        }

        if form.stored_name.is_some() {
            return Err(AppError::BadRequest("Only one video file is allowed".to_string()));
        }

        let original_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "video".to_string());
        let stored_name = stored_file_name(&original_name);

        tokio::fs::create_dir_all(upload_dir)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to create upload dir: {e}")))?;

        let path = upload_dir.join(&stored_name);
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to create file: {e}")))?;
        form.original_name = Some(original_name);
        form.stored_name = Some(stored_name);

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::InternalError(format!("Failed to write file: {e}")))?;
            form.size_bytes += chunk.len() as i64;
        }
        file.flush()
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to write file: {e}")))?;
    }
    Ok(())
}

/// Random on-disk name; keeps a short alphanumeric extension so static
/// serving picks a sensible content type.
fn stored_file_name(original_name: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    let extension = FsPath::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()));
    match extension {
        Some(ext) => format!("{id}.{}", ext.to_ascii_lowercase()),
        None => id,
    }
}

/// Path of a stored upload. Only the final component of `filepath` is
/// used so a row can never point outside the upload directory.
fn stored_path(upload_dir: &FsPath, filepath: &str) -> Option<PathBuf> {
    FsPath::new(filepath)
        .file_name()
        .map(|name| upload_dir.join(name))
}

async fn remove_stored_file(upload_dir: &FsPath, filepath: &str) {
    let Some(path) = stored_path(upload_dir, filepath) else {
        return;
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed stored video"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove stored video")
        }
    }
}

// ---------------------------------------------------------------------------
// Listing and deletion
// ---------------------------------------------------------------------------

/// GET /api/videos
pub async fn list_videos(State(state): State<AppState>) -> AppResult<Json<Vec<Video>>> {
    let videos = VideoRepo::list(&state.pool).await?;
    Ok(Json(videos))
}

/// DELETE /api/videos/{id}
///
/// Logs and alerts go with the row; the stored file is removed afterwards
/// if it is still on disk.
pub async fn delete_video(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let video = VideoRepo::delete(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id,
        }))?;

    remove_stored_file(&state.config.upload_dir, &video.filepath).await;
    tracing::info!(video_id = id, "Video deleted");

    Ok(Json(MessageResponse {
        message: MSG_VIDEO_DELETED,
    }))
}

// ---------------------------------------------------------------------------
// Analysis save
// ---------------------------------------------------------------------------

/// PUT /api/videos/{id}/analysis
pub async fn save_analysis(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    payload: Result<Json<SaveAnalysisRequest>, JsonRejection>,
) -> AppResult<Json<SaveAnalysisResponse>> {
    let Json(input) = payload?;
    let outcome = state.orchestrator.save_analysis(id, input).await?;

    Ok(Json(SaveAnalysisResponse {
        message: MSG_ANALYSIS_SAVED,
        video: outcome.video,
        ai_report: outcome.ai_report,
        classification: outcome.classification,
        deliveries: outcome.deliveries,
    }))
}
