//! Fan-out of one incident to every configured channel.
//!
//! Channels run one after the other and never affect each other: a failed
//! email is recorded and the WhatsApp message is still attempted. The
//! per-channel outcomes are returned so the caller can store an honest
//! delivery status.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use smartway_core::channels::{CHANNEL_EMAIL, CHANNEL_WHATSAPP};
use smartway_core::classification::IncidentClassification;

use crate::delivery::email::{EmailTransport, InlineAttachment, OutgoingEmail};
use crate::delivery::whatsapp::{MessageTransport, OutgoingMessage};
use crate::location::{self, IncidentLocation};
use crate::template::{self, AlertContent, SNAPSHOT_CONTENT_ID, SNAPSHOT_FILENAME};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Sent,
    /// Channel not configured; not a failure.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelDelivery {
    pub channel: &'static str,
    #[serde(flatten)]
    pub outcome: DeliveryOutcome,
}

/// Aggregate status stored in `alert_messages.delivery_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Every attempted channel succeeded.
    Sent,
    /// Some attempted channels failed.
    Partial,
    /// Every attempted channel failed.
    Failed,
    /// No channel was configured.
    Skipped,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Partial => "partial",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    pub fn from_deliveries(deliveries: &[ChannelDelivery]) -> Self {
        let attempted: Vec<_> = deliveries
            .iter()
            .filter(|d| d.outcome != DeliveryOutcome::Skipped)
            .collect();
        let sent = attempted
            .iter()
            .filter(|d| d.outcome == DeliveryOutcome::Sent)
            .count();

        match (attempted.len(), sent) {
            (0, _) => Self::Skipped,
            (n, s) if n == s => Self::Sent,
            (_, 0) => Self::Failed,
            _ => Self::Partial,
        }
    }
}

/// What happened when an incident was dispatched.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// The fixed-format alert text, stored on the alert record.
    pub alert_text: String,
    /// Primary recipient: the video's contact email, else the sender account.
    pub recipient: Option<String>,
    pub deliveries: Vec<ChannelDelivery>,
}

impl DispatchReport {
    pub fn delivery_status(&self) -> DeliveryStatus {
        DeliveryStatus::from_deliveries(&self.deliveries)
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One classified incident with its context.
#[derive(Debug, Clone)]
pub struct IncidentAlert<'a> {
    pub classification: &'a IncidentClassification,
    /// Address of the video; `None` when the row could not be loaded.
    pub location: Option<&'a IncidentLocation>,
    /// Contact email stored on the video.
    pub recipient: Option<&'a str>,
    pub sms_summary: Option<&'a str>,
    /// Forensic report for the email body.
    pub narrative: Option<&'a str>,
    pub snapshot: Option<&'a Path>,
    pub detected_vehicles: i64,
    pub time: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// AlertDispatcher
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct AlertDispatcher {
    email: Option<Arc<dyn EmailTransport>>,
    whatsapp: Option<Arc<dyn MessageTransport>>,
}

impl AlertDispatcher {
    pub fn new(
        email: Option<Arc<dyn EmailTransport>>,
        whatsapp: Option<Arc<dyn MessageTransport>>,
    ) -> Self {
        Self { email, whatsapp }
    }

    /// Names of the channels that will be attempted, in dispatch order.
    pub fn configured_channels(&self) -> Vec<&'static str> {
        let mut channels = Vec::with_capacity(2);
        if self.email.is_some() {
            channels.push(CHANNEL_EMAIL);
        }
        if self.whatsapp.is_some() {
            channels.push(CHANNEL_WHATSAPP);
        }
        channels
    }

    pub async fn dispatch(&self, alert: &IncidentAlert<'_>) -> DispatchReport {
        let content = AlertContent {
            time: alert.time,
            location: location::describe(alert.location),
            map_link: alert.location.and_then(IncidentLocation::map_link),
            severity: alert.classification.severity,
            detected_vehicles: alert.detected_vehicles,
            snapshot_path: alert.snapshot.map(|p| p.display().to_string()),
            sms_summary: alert.sms_summary.map(str::to_owned),
        };
        let recipient = alert
            .recipient
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_owned)
            .or_else(|| self.email.as_ref().map(|t| t.sender().to_string()));

        tracing::info!(
            category = %alert.classification.category,
            location = %content.location,
            "Triggering alerts"
        );

        let email = self.send_email(alert, &content, recipient.as_deref()).await;
        let whatsapp = self.send_whatsapp(&content).await;

        DispatchReport {
            alert_text: template::alert_text(&content),
            recipient,
            deliveries: vec![email, whatsapp],
        }
    }

    async fn send_email(
        &self,
        alert: &IncidentAlert<'_>,
        content: &AlertContent,
        recipient: Option<&str>,
    ) -> ChannelDelivery {
        let outcome = match (&self.email, recipient) {
            (Some(transport), Some(to)) => {
                let attachments: Vec<InlineAttachment> = match alert.snapshot {
                    Some(path) => load_snapshot_attachment(path).await.into_iter().collect(),
                    None => Vec::new(),
                };
                let email = OutgoingEmail {
                    from: transport.sender().to_string(),
                    to: to.to_string(),
                    subject: template::email_subject(
                        alert.location.and_then(IncidentLocation::city),
                    ),
                    html: template::email_html(content, alert.narrative, !attachments.is_empty()),
                    attachments,
                };
                match transport.send(&email).await {
                    Ok(()) => DeliveryOutcome::Sent,
                    Err(e) => {
                        tracing::error!(
                            channel = CHANNEL_EMAIL,
                            error = %e,
                            "Alert delivery failed"
                        );
                        DeliveryOutcome::Failed(e.to_string())
                    }
                }
            }
            _ => {
                tracing::info!(channel = CHANNEL_EMAIL, "Alert channel not configured, skipping");
                DeliveryOutcome::Skipped
            }
        };
        ChannelDelivery {
            channel: CHANNEL_EMAIL,
            outcome,
        }
    }

    async fn send_whatsapp(&self, content: &AlertContent) -> ChannelDelivery {
        let outcome = match &self.whatsapp {
            Some(transport) => {
                let message = OutgoingMessage {
                    body: template::message_body(content),
                    from: transport.sender(),
                    to: transport.destination(),
                };
                match transport.send(&message).await {
                    Ok(()) => DeliveryOutcome::Sent,
                    Err(e) => {
                        tracing::error!(
                            channel = CHANNEL_WHATSAPP,
                            error = %e,
                            "Alert delivery failed"
                        );
                        DeliveryOutcome::Failed(e.to_string())
                    }
                }
            }
            None => {
                tracing::info!(
                    channel = CHANNEL_WHATSAPP,
                    "Alert channel not configured, skipping"
                );
                DeliveryOutcome::Skipped
            }
        };
        ChannelDelivery {
            channel: CHANNEL_WHATSAPP,
            outcome,
        }
    }
}

/// Read the snapshot for inline embedding. Unreadable files are skipped so
/// the email still goes out without the image.
async fn load_snapshot_attachment(path: &Path) -> Option<InlineAttachment> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(InlineAttachment {
            filename: SNAPSHOT_FILENAME.to_string(),
            content_id: SNAPSHOT_CONTENT_ID.to_string(),
            content_type: "image/jpeg".to_string(),
            bytes,
        }),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Snapshot not attached");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
