//! End-to-end analysis saves against in-memory collaborators.
//!
//! The store, vision model and transports are fakes that record what the
//! orchestrator asked of them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use smartway_core::classification::IncidentCategory;
use smartway_core::types::DbId;
use smartway_db::models::alert_message::{AlertMessage, CreateAlertMessage};
use smartway_db::models::traffic_log::{CreateTrafficLog, TrafficLog};
use smartway_db::models::video::Video;
use smartway_events::delivery::email::{EmailError, EmailTransport, OutgoingEmail};
use smartway_events::delivery::whatsapp::{MessageError, MessageTransport, OutgoingMessage};
use smartway_events::{AlertDispatcher, DeliveryOutcome};
use smartway_pipeline::{
    AnalysisOrchestrator, AnalysisStore, ErrorSink, PipelineError, SaveAnalysisRequest,
    NOT_GENERATED_NARRATIVE,
};
use smartway_vision::{ForensicEnricher, InlineImage, VisionError, VisionModel};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct InMemoryStore {
    videos: Mutex<HashMap<DbId, Video>>,
    logs: Mutex<Vec<CreateTrafficLog>>,
    alerts: Mutex<Vec<CreateAlertMessage>>,
    fail_log_insert: bool,
    fail_alert_insert: bool,
}

impl InMemoryStore {
    fn with_video(id: DbId) -> Self {
        let store = Self::default();
        let now = Utc::now();
        store.videos.lock().unwrap().insert(
            id,
            Video {
                id,
                filename: "junction.mp4".to_string(),
                filepath: "uploads/junction.mp4".to_string(),
                size_bytes: 2048,
                status: "processing".to_string(),
                analysis_summary: None,
                address_line: None,
                city: Some("Pune".to_string()),
                state: None,
                country: None,
                pincode: Some("411004".to_string()),
                road_name: Some("FC Road".to_string()),
                email: Some("ops@example.com".to_string()),
                created_at: now,
                updated_at: now,
            },
        );
        store
    }

    fn logs(&self) -> Vec<CreateTrafficLog> {
        self.logs.lock().unwrap().clone()
    }

    fn alerts(&self) -> Vec<CreateAlertMessage> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisStore for InMemoryStore {
    async fn update_analysis(
        &self,
        video_id: DbId,
        status: &str,
        summary: &Value,
    ) -> Result<Option<Video>, sqlx::Error> {
        let mut videos = self.videos.lock().unwrap();
        Ok(videos.get_mut(&video_id).map(|video| {
            video.status = status.to_string();
            video.analysis_summary = Some(summary.clone());
            video.clone()
        }))
    }

    async fn insert_traffic_log(&self, log: &CreateTrafficLog) -> Result<TrafficLog, sqlx::Error> {
        if self.fail_log_insert {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let mut logs = self.logs.lock().unwrap();
        logs.push(log.clone());
        Ok(TrafficLog {
            id: logs.len() as DbId,
            video_id: log.video_id,
            vehicle_count: log.vehicle_count,
            emergency_detected: log.emergency_detected,
            analysis_data: log.analysis_data.clone(),
            detailed_analysis: log.detailed_analysis.clone(),
            snapshot_url: log.snapshot_url.clone(),
            signal_status: log.signal_status.clone(),
            created_at: Utc::now(),
        })
    }

    async fn insert_alert(&self, alert: &CreateAlertMessage) -> Result<AlertMessage, sqlx::Error> {
        if self.fail_alert_insert {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let mut alerts = self.alerts.lock().unwrap();
        alerts.push(alert.clone());
        Ok(AlertMessage {
            id: alerts.len() as DbId,
            video_id: alert.video_id,
            alert_type: alert.alert_type.clone(),
            message: alert.message.clone(),
            recipient: alert.recipient.clone(),
            delivery_status: alert.delivery_status.clone(),
            created_at: Utc::now(),
        })
    }
}

struct ScriptedModel {
    response: Result<String, String>,
}

#[async_trait]
impl VisionModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _image: Option<&InlineImage>,
    ) -> Result<String, VisionError> {
        self.response.clone().map_err(|body| VisionError::Api { status: 429, body })
    }
}

#[derive(Default)]
struct RecordingMailer {
    fail: bool,
    sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl EmailTransport for RecordingMailer {
    fn sender(&self) -> &str {
        "alerts@example.com"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(email.clone());
        if self.fail {
            return Err(EmailError::Build("simulated SMTP outage".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingMessenger {
    sent: Mutex<Vec<OutgoingMessage>>,
}

#[async_trait]
impl MessageTransport for RecordingMessenger {
    fn sender(&self) -> String {
        "whatsapp:+14155238886".to_string()
    }

    fn destination(&self) -> String {
        "whatsapp:+919800000000".to_string()
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<(), MessageError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

const VIDEO_ID: DbId = 42;

struct Harness {
    store: Arc<InMemoryStore>,
    mailer: Arc<RecordingMailer>,
    messenger: Arc<RecordingMessenger>,
    sink_dir: tempfile::TempDir,
}

impl Harness {
    fn new(store: InMemoryStore, mailer: RecordingMailer) -> Self {
        Self {
            store: Arc::new(store),
            mailer: Arc::new(mailer),
            messenger: Arc::new(RecordingMessenger::default()),
            sink_dir: tempfile::tempdir().unwrap(),
        }
    }

    fn sink_path(&self) -> std::path::PathBuf {
        self.sink_dir.path().join("db_errors.txt")
    }

    fn orchestrator(&self, model: Option<ScriptedModel>) -> AnalysisOrchestrator {
        let enricher = model.map(|m| ForensicEnricher::new(Arc::new(m), Duration::from_secs(5)));
        let email: Arc<dyn EmailTransport> = self.mailer.clone();
        let whatsapp: Arc<dyn MessageTransport> = self.messenger.clone();
        let dispatcher = AlertDispatcher::new(Some(email), Some(whatsapp));
        AnalysisOrchestrator::new(
            self.store.clone(),
            enricher,
            dispatcher,
            ErrorSink::new(self.sink_path()),
        )
    }

    fn messages(&self) -> Vec<OutgoingMessage> {
        self.messenger.sent.lock().unwrap().clone()
    }

    fn emails(&self) -> Vec<OutgoingEmail> {
        self.mailer.sent.lock().unwrap().clone()
    }
}

fn request(summary: Value) -> SaveAnalysisRequest {
    SaveAnalysisRequest {
        analysis_summary: summary,
        snapshot_path: None,
    }
}

fn model_returning(text: &str) -> ScriptedModel {
    ScriptedModel {
        response: Ok(text.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn orchestrator_reports_its_collaborators() {
    let h = Harness::new(InMemoryStore::default(), RecordingMailer::default());

    let bare = h.orchestrator(None);
    assert_eq!(bare.vision_model(), None);
    assert_eq!(bare.alert_channels(), vec!["email", "whatsapp"]);

    let enriched = h.orchestrator(Some(model_returning("{}")));
    assert_eq!(enriched.vision_model(), Some("scripted"));
}

#[tokio::test]
async fn ambulance_without_model_alerts_as_congestion() {
    let h = Harness::new(InMemoryStore::with_video(VIDEO_ID), RecordingMailer::default());

    let outcome = h
        .orchestrator(None)
        .save_analysis(VIDEO_ID, request(json!({"car": 10, "ambulance": 1})))
        .await
        .unwrap();

    assert_eq!(outcome.ai_report, NOT_GENERATED_NARRATIVE);
    assert_eq!(outcome.classification.total_vehicle_count, 11);
    assert!(outcome.classification.has_emergency);
    assert_eq!(outcome.video.status, "processed");

    let logs = h.store.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].vehicle_count, 11);
    assert!(logs[0].emergency_detected);
    assert_eq!(logs[0].signal_status, "red");
    assert_eq!(logs[0].detailed_analysis, json!({"ai_report": NOT_GENERATED_NARRATIVE}));

    let alerts = h.store.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, "Congestion");
    assert_eq!(alerts[0].recipient.as_deref(), Some("ops@example.com"));
    assert_eq!(alerts[0].delivery_status, "sent");
    assert!(alerts[0].message.contains("Severity: HIGH"));

    // No model digest: the message is the fixed-format alert.
    let messages = h.messages();
    assert_eq!(messages[0].body, alerts[0].message);
}

#[tokio::test]
async fn model_corrections_are_merged_and_digest_is_sent() {
    let h = Harness::new(InMemoryStore::with_video(VIDEO_ID), RecordingMailer::default());
    let model = model_returning(
        r#"```json
{"updated_data":{"police":1},"html_report":"<h3>Forensic findings</h3>","sms_summary":"Fire!"}
```"#,
    );

    let outcome = h
        .orchestrator(Some(model))
        .save_analysis(VIDEO_ID, request(json!({"ACCIDENT": 1})))
        .await
        .unwrap();

    assert_eq!(outcome.ai_report, "<h3>Forensic findings</h3>");
    assert_eq!(outcome.classification.category, IncidentCategory::Emergency);
    assert_eq!(
        outcome.video.analysis_summary,
        Some(json!({"ACCIDENT": 1, "police": 1}))
    );

    let alerts = h.store.alerts();
    assert_eq!(alerts[0].alert_type, "Emergency");
    assert!(alerts[0].message.contains("Severity: CRITICAL"));
    assert!(alerts[0].message.contains("Detected: 1 Vehicle(s) involved."));

    let messages = h.messages();
    assert_eq!(
        messages[0].body,
        "🚨 *SMARTWAY ALERT* 🚨\nFire!\n\n📍 FC Road, Pune, 411004\n\
         🔗 https://www.google.com/maps/search/?api=1&query=FC+Road%2C+Pune%2C+411004"
    );
    assert_eq!(messages[0].to, "whatsapp:+919800000000");

    let emails = h.mailer.sent.lock().unwrap();
    assert!(emails[0].html.contains("<h3>Forensic findings</h3>"));
    assert_eq!(emails[0].subject, "🚨 ACCIDENT ALERT at Pune");
}

#[tokio::test]
async fn email_failure_still_sends_whatsapp_and_succeeds() {
    let h = Harness::new(
        InMemoryStore::with_video(VIDEO_ID),
        RecordingMailer {
            fail: true,
            ..Default::default()
        },
    );

    let outcome = h
        .orchestrator(None)
        .save_analysis(VIDEO_ID, request(json!({"ACCIDENT": 2, "car": 1})))
        .await
        .unwrap();

    assert_eq!(h.messages().len(), 1);
    assert_eq!(h.store.alerts()[0].delivery_status, "partial");

    let email = outcome.deliveries.iter().find(|d| d.channel == "email").unwrap();
    assert_matches!(
        &email.outcome,
        DeliveryOutcome::Failed(e) if e.contains("simulated SMTP outage")
    );
}

#[tokio::test]
async fn model_failure_falls_back_and_still_logs() {
    let h = Harness::new(InMemoryStore::with_video(VIDEO_ID), RecordingMailer::default());
    let model = ScriptedModel {
        response: Err("quota exceeded".to_string()),
    };

    let outcome = h
        .orchestrator(Some(model))
        .save_analysis(VIDEO_ID, request(json!({"car": 4})))
        .await
        .unwrap();

    assert!(outcome.ai_report.starts_with("AI Analysis Failed"));
    assert!(outcome.ai_report.contains("quota exceeded"));
    assert_eq!(outcome.video.analysis_summary, Some(json!({"car": 4})));

    let logs = h.store.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].signal_status, "green");
    assert!(h.store.alerts().is_empty());
    assert!(outcome.deliveries.is_empty());
}

#[tokio::test]
async fn log_insert_failure_goes_to_error_sink() {
    let store = InMemoryStore {
        fail_log_insert: true,
        ..InMemoryStore::with_video(VIDEO_ID)
    };
    let h = Harness::new(store, RecordingMailer::default());

    let outcome = h
        .orchestrator(None)
        .save_analysis(VIDEO_ID, request(json!({"car": 2})))
        .await
        .unwrap();

    assert!(outcome.traffic_log.is_none());
    let sink = std::fs::read_to_string(h.sink_path()).unwrap();
    assert!(sink.contains("Log Insert Error"));
    assert!(sink.contains("\"vehicle_count\":2"));
}

#[tokio::test]
async fn alert_insert_failure_still_notifies_and_goes_to_error_sink() {
    let store = InMemoryStore {
        fail_alert_insert: true,
        ..InMemoryStore::with_video(VIDEO_ID)
    };
    let h = Harness::new(store, RecordingMailer::default());

    let outcome = h
        .orchestrator(None)
        .save_analysis(VIDEO_ID, request(json!({"ACCIDENT": 1})))
        .await
        .unwrap();

    assert!(outcome.alert.is_none());
    assert!(outcome.traffic_log.is_some());
    assert_eq!(h.emails().len(), 1);
    assert_eq!(h.messages().len(), 1);
    assert!(outcome
        .deliveries
        .iter()
        .all(|d| d.outcome == DeliveryOutcome::Sent));

    let sink = std::fs::read_to_string(h.sink_path()).unwrap();
    assert!(sink.contains("Alert Insert Error"));
    assert!(sink.contains("\"alert_type\":\"Emergency\""));
    assert!(sink.contains("\"video_id\":42"));
}

#[tokio::test]
async fn unknown_video_is_not_found_and_writes_nothing() {
    let h = Harness::new(InMemoryStore::default(), RecordingMailer::default());

    let result = h
        .orchestrator(None)
        .save_analysis(VIDEO_ID, request(json!({"ACCIDENT": 1})))
        .await;

    assert_matches!(result, Err(PipelineError::NotFound(VIDEO_ID)));
    assert!(h.store.logs().is_empty());
    assert!(h.store.alerts().is_empty());
    assert!(h.messages().is_empty());
}

#[tokio::test]
async fn non_object_summary_is_rejected_before_any_write() {
    let h = Harness::new(InMemoryStore::with_video(VIDEO_ID), RecordingMailer::default());

    let result = h
        .orchestrator(None)
        .save_analysis(VIDEO_ID, request(Value::Null))
        .await;

    assert_matches!(result, Err(PipelineError::Input(_)));
    assert!(h.store.logs().is_empty());
    let video = h.store.videos.lock().unwrap()[&VIDEO_ID].clone();
    assert_eq!(video.status, "processing");
}

#[tokio::test]
async fn snapshot_is_found_in_snapshot_dir() {
    let snapshots = tempfile::tempdir().unwrap();
    std::fs::write(snapshots.path().join("snapshot_42.jpg"), b"jpeg").unwrap();

    let h = Harness::new(InMemoryStore::with_video(VIDEO_ID), RecordingMailer::default());
    let orchestrator = h.orchestrator(None).with_snapshot_dir(snapshots.path());

    orchestrator
        .save_analysis(
            VIDEO_ID,
            SaveAnalysisRequest {
                analysis_summary: json!({"ACCIDENT": 1}),
                snapshot_path: Some("detector/output/snapshot_42.jpg".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(
        h.store.logs()[0].snapshot_url.as_deref(),
        Some("detector/output/snapshot_42.jpg")
    );
    let emails = h.mailer.sent.lock().unwrap();
    assert_eq!(emails[0].attachments.len(), 1);
    assert!(emails[0].html.contains("cid:accident_snapshot"));
}

#[tokio::test]
async fn snapshot_outside_snapshot_dir_is_never_attached() {
    let snapshots = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let secret = elsewhere.path().join("credentials.env");
    std::fs::write(&secret, b"DATABASE_PASSWORD=hunter2").unwrap();
    let parent_escape = format!(
        "../{}/credentials.env",
        elsewhere.path().file_name().unwrap().to_str().unwrap()
    );

    for snapshot_path in [secret.display().to_string(), parent_escape] {
        let h = Harness::new(InMemoryStore::with_video(VIDEO_ID), RecordingMailer::default());
        let orchestrator = h.orchestrator(None).with_snapshot_dir(snapshots.path());

        orchestrator
            .save_analysis(
                VIDEO_ID,
                SaveAnalysisRequest {
                    analysis_summary: json!({"ACCIDENT": 1}),
                    snapshot_path: Some(snapshot_path.clone()),
                },
            )
            .await
            .unwrap();

        let emails = h.emails();
        assert_eq!(emails.len(), 1, "{snapshot_path}");
        assert!(emails[0].attachments.is_empty(), "{snapshot_path}");
        assert!(!emails[0].html.contains("cid:"), "{snapshot_path}");
        assert!(!emails[0].html.contains("hunter2"));
    }
}

#[tokio::test]
async fn snapshot_is_ignored_without_snapshot_dir() {
    let elsewhere = tempfile::tempdir().unwrap();
    std::fs::write(elsewhere.path().join("snapshot_42.jpg"), b"jpeg").unwrap();
    let h = Harness::new(InMemoryStore::with_video(VIDEO_ID), RecordingMailer::default());

    h.orchestrator(None)
        .save_analysis(
            VIDEO_ID,
            SaveAnalysisRequest {
                analysis_summary: json!({"ACCIDENT": 1}),
                snapshot_path: Some("snapshot_42.jpg".to_string()),
            },
        )
        .await
        .unwrap();

    assert!(h.emails()[0].attachments.is_empty());
}
