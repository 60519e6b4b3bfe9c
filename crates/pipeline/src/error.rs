use smartway_core::summary::SummaryError;
use smartway_core::types::DbId;

/// Failures that abort an analysis save.
///
/// Enrichment, audit-log and notification failures are recovered inside the
/// orchestrator and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The submitted summary is not a usable JSON object.
    #[error("Invalid analysis_summary: {0}")]
    Input(#[from] SummaryError),

    #[error("Video with id {0} not found")]
    NotFound(DbId),

    /// The primary video update failed.
    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),
}
