//! The analysis save flow for one video.
//!
//! `received → enriching → merged → persisted → (dispatching) → responded`
//!
//! Only two failures abort the flow: an unusable summary (before anything is
//! written) and a failed video update. Everything after the video update is
//! audit or notification work and is recovered locally.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use smartway_core::classification::{classify, IncidentClassification};
use smartway_core::reconciliation::reconcile;
use smartway_core::summary::AnalysisSummary;
use smartway_core::types::DbId;
use smartway_core::video_status::{signal_status, VIDEO_STATUS_PROCESSED};
use smartway_db::models::alert_message::{AlertMessage, CreateAlertMessage};
use smartway_db::models::traffic_log::{CreateTrafficLog, TrafficLog};
use smartway_db::models::video::Video;
use smartway_events::{AlertDispatcher, ChannelDelivery, IncidentAlert, IncidentLocation};
use smartway_vision::{EnrichmentOutcome, ForensicEnricher};

use crate::error::PipelineError;
use crate::error_sink::ErrorSink;
use crate::locks::VideoLocks;
use crate::stage::AnalysisStage;
use crate::store::AnalysisStore;

/// Narrative stored when no vision model is configured.
pub const NOT_GENERATED_NARRATIVE: &str = "AI Report not generated (Missing Key or Snapshot)";

/// Body of `PUT /api/videos/{id}/analysis`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveAnalysisRequest {
    #[serde(default)]
    pub analysis_summary: Value,
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

/// Result of a completed save.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub video: Video,
    pub ai_report: String,
    pub classification: IncidentClassification,
    /// Inserted log row; `None` when the insert failed and went to the sink.
    pub traffic_log: Option<TrafficLog>,
    pub alert: Option<AlertMessage>,
    /// Empty unless an emergency was dispatched.
    pub deliveries: Vec<ChannelDelivery>,
}

/// What enrichment contributed to a save.
struct Enrichment {
    merged: AnalysisSummary,
    narrative: String,
    sms_summary: Option<String>,
    /// Model report fit for the email body.
    report: Option<String>,
}

pub struct AnalysisOrchestrator {
    store: Arc<dyn AnalysisStore>,
    enricher: Option<ForensicEnricher>,
    dispatcher: AlertDispatcher,
    error_sink: ErrorSink,
    locks: VideoLocks,
    snapshot_dir: Option<PathBuf>,
}

impl AnalysisOrchestrator {
    pub fn new(
        store: Arc<dyn AnalysisStore>,
        enricher: Option<ForensicEnricher>,
        dispatcher: AlertDispatcher,
        error_sink: ErrorSink,
    ) -> Self {
        Self {
            store,
            enricher,
            dispatcher,
            error_sink,
            locks: VideoLocks::new(),
            snapshot_dir: None,
        }
    }

    /// Directory snapshots are read from. Without one, snapshots are ignored.
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    /// Model used for forensic enrichment, if one is configured.
    pub fn vision_model(&self) -> Option<&str> {
        self.enricher.as_ref().map(ForensicEnricher::model_name)
    }

    /// Notification channels an emergency would be sent through.
    pub fn alert_channels(&self) -> Vec<&'static str> {
        self.dispatcher.configured_channels()
    }

    pub async fn save_analysis(
        &self,
        video_id: DbId,
        request: SaveAnalysisRequest,
    ) -> Result<AnalysisOutcome, PipelineError> {
        tracing::info!(video_id, stage = %AnalysisStage::Received, "Saving analysis");
        let summary = AnalysisSummary::from_value(request.analysis_summary)?;

        let _guard = self.locks.lock(video_id).await;

        let snapshot = request
            .snapshot_path
            .as_deref()
            .and_then(|raw| self.resolve_snapshot(video_id, raw));

        // Enrich and merge.
        let Enrichment {
            merged,
            narrative,
            sms_summary,
            report: forensic_report,
        } = self.enrich(video_id, summary, snapshot.as_deref()).await;
        let merged_value = merged.to_value();
        tracing::info!(
            video_id,
            stage = %AnalysisStage::Merged,
            summary = %merged_value,
            "Summary merged"
        );

        // Primary record.
        let video = self
            .store
            .update_analysis(video_id, VIDEO_STATUS_PROCESSED, &merged_value)
            .await?
            .ok_or(PipelineError::NotFound(video_id))?;
        tracing::info!(video_id, stage = %AnalysisStage::Persisted, "Video analysis updated");

        // Audit log.
        let reconciliation = reconcile(&merged);
        let classification = classify(&merged, &reconciliation);
        let log = CreateTrafficLog {
            video_id,
            vehicle_count: classification.total_vehicle_count,
            emergency_detected: classification.has_emergency,
            analysis_data: merged_value,
            detailed_analysis: json!({ "ai_report": narrative }),
            snapshot_url: request.snapshot_path.clone(),
            signal_status: signal_status(classification.has_emergency).to_string(),
        };
        let traffic_log = match self.store.insert_traffic_log(&log).await {
            Ok(row) => Some(row),
            Err(e) => {
                tracing::error!(video_id, error = %e, "Failed to insert traffic log");
                self.error_sink.record("Log Insert Error", &e, &log).await;
                None
            }
        };

        // Alerts.
        let (alert, deliveries) = if classification.has_emergency {
            tracing::info!(
                video_id,
                stage = %AnalysisStage::Dispatching,
                category = %classification.category,
                "Emergency detected"
            );
            let location = IncidentLocation {
                road_name: video.road_name.clone(),
                city: video.city.clone(),
                pincode: video.pincode.clone(),
            };
            let report = self
                .dispatcher
                .dispatch(&IncidentAlert {
                    classification: &classification,
                    location: Some(&location),
                    recipient: video.email.as_deref(),
                    sms_summary: sms_summary.as_deref(),
                    narrative: forensic_report.as_deref(),
                    snapshot: snapshot.as_deref(),
                    detected_vehicles: merged.accident_count().filter(|n| *n > 0).unwrap_or(1),
                    time: Utc::now(),
                })
                .await;

            let record = CreateAlertMessage {
                video_id,
                alert_type: classification.category.as_str().to_string(),
                message: report.alert_text.clone(),
                recipient: report.recipient.clone(),
                delivery_status: report.delivery_status().as_str().to_string(),
            };
            let alert = match self.store.insert_alert(&record).await {
                Ok(row) => Some(row),
                Err(e) => {
                    tracing::error!(video_id, error = %e, "Failed to insert alert message");
                    self.error_sink.record("Alert Insert Error", &e, &record).await;
                    None
                }
            };
            (alert, report.deliveries)
        } else {
            (None, Vec::new())
        };

        tracing::info!(
            video_id,
            stage = %AnalysisStage::Responded,
            vehicle_count = classification.total_vehicle_count,
            emergency = classification.has_emergency,
            "Analysis saved"
        );

        Ok(AnalysisOutcome {
            video,
            ai_report: narrative,
            classification,
            traffic_log,
            alert,
            deliveries,
        })
    }

    async fn enrich(
        &self,
        video_id: DbId,
        summary: AnalysisSummary,
        snapshot: Option<&Path>,
    ) -> Enrichment {
        let Some(enricher) = &self.enricher else {
            tracing::info!(video_id, "Vision model not configured, skipping enrichment");
            return Enrichment {
                merged: summary,
                narrative: NOT_GENERATED_NARRATIVE.to_string(),
                sms_summary: None,
                report: None,
            };
        };

        tracing::info!(
            video_id,
            stage = %AnalysisStage::Enriching,
            has_snapshot = snapshot.is_some(),
            "Requesting forensic report"
        );
        let correction = enricher.enrich(&summary, snapshot).await;

        let narrative = correction.narrative().to_string();
        let report = (correction.outcome == EnrichmentOutcome::Decoded)
            .then(|| correction.html_report.clone())
            .flatten();

        let mut merged = summary;
        merged.merge(correction.updated_data);

        Enrichment {
            merged,
            narrative,
            sms_summary: correction.sms_summary,
            report,
        }
    }

    /// Map a detector-reported snapshot path into the snapshot directory.
    ///
    /// Only the file name is kept. Absolute paths and paths with `..` are
    /// refused, as is everything when no snapshot directory is configured.
    fn resolve_snapshot(&self, video_id: DbId, raw: &str) -> Option<PathBuf> {
        let path = Path::new(raw);
        let confined = !path.is_absolute()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !confined {
            tracing::warn!(
                video_id,
                snapshot_path = raw,
                "Ignoring snapshot outside the snapshot directory"
            );
            return None;
        }
        let dir = self.snapshot_dir.as_ref()?;
        path.file_name().map(|name| dir.join(name))
    }
}
