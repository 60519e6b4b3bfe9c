//! Lifecycle values stored in the `videos.status` column.

/// Upload accepted, detector has not answered yet.
pub const VIDEO_STATUS_PROCESSING: &str = "processing";

/// Detector (or a later analysis save) produced a summary.
pub const VIDEO_STATUS_PROCESSED: &str = "processed";

/// The upstream detector call failed; the file is kept for a retry.
pub const VIDEO_STATUS_ANALYSIS_FAILED: &str = "analysis_failed";

/// Signal recommendation written to `traffic_logs.signal_status` when an
/// emergency is detected.
pub const SIGNAL_RED: &str = "red";

/// Signal recommendation for normal traffic.
pub const SIGNAL_GREEN: &str = "green";

/// Map the emergency flag to the signal recommendation stored with a log.
pub fn signal_status(has_emergency: bool) -> &'static str {
    if has_emergency {
        SIGNAL_RED
    } else {
        SIGNAL_GREEN
    }
}
