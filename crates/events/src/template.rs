//! Alert text rendered for each channel.

use chrono::{DateTime, Utc};
use smartway_core::classification::Severity;

/// Content id linking the email `<img>` to its inline attachment.
pub const SNAPSHOT_CONTENT_ID: &str = "accident_snapshot";

/// Attachment filename of the inline snapshot.
pub const SNAPSHOT_FILENAME: &str = "accident_snapshot.jpg";

const NOT_AVAILABLE: &str = "Not Available";

/// Everything the templates interpolate.
#[derive(Debug, Clone)]
pub struct AlertContent {
    pub time: DateTime<Utc>,
    pub location: String,
    pub map_link: Option<String>,
    pub severity: Severity,
    /// Vehicles reported as involved.
    pub detected_vehicles: i64,
    pub snapshot_path: Option<String>,
    /// Short model digest, when the model produced one.
    pub sms_summary: Option<String>,
}

impl AlertContent {
    fn time_label(&self) -> String {
        self.time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

/// The fixed-format alert. Stored on the alert record and used as the
/// message body when no model digest exists.
pub fn alert_text(content: &AlertContent) -> String {
    format!(
        "🚨 CRITICAL TRAFFIC ACCIDENT ALERT 🚨\n\
         Time: {time}\n\
         Location: {location}\n\
         Severity: {severity}\n\
         Detected: {vehicles} Vehicle(s) involved.\n\
         \n\
         VIEW LOCATION: {link}\n\
         SNAPSHOT: {snapshot}",
        time = content.time_label(),
        location = content.location,
        severity = content.severity.label(),
        vehicles = content.detected_vehicles,
        link = content.map_link.as_deref().unwrap_or(NOT_AVAILABLE),
        snapshot = content.snapshot_path.as_deref().unwrap_or(NOT_AVAILABLE),
    )
}

/// Instant-message body: the model digest with location, or the fixed alert.
pub fn message_body(content: &AlertContent) -> String {
    let Some(summary) = content.sms_summary.as_deref() else {
        return alert_text(content);
    };

    let mut body = format!("🚨 *SMARTWAY ALERT* 🚨\n{summary}\n\n📍 {}", content.location);
    if let Some(link) = &content.map_link {
        body.push_str(&format!("\n🔗 {link}"));
    }
    body
}

pub fn email_subject(city: Option<&str>) -> String {
    format!("🚨 ACCIDENT ALERT at {}", city.unwrap_or("Unknown"))
}

/// HTML alert email. `narrative` is the model's forensic report, included
/// below the summary when available; `with_snapshot` embeds the inline image.
pub fn email_html(content: &AlertContent, narrative: Option<&str>, with_snapshot: bool) -> String {
    let summary = content
        .sms_summary
        .as_deref()
        .map(|s| escape_html(s).replace('\n', "<br>"))
        .unwrap_or_else(|| "Accident Detected".to_string());

    let snapshot = if with_snapshot {
        format!(
            r#"<div style="margin-bottom: 20px; text-align: center;">
      <img src="cid:{SNAPSHOT_CONTENT_ID}" alt="Accident Snapshot" style="max-width: 100%; border-radius: 4px; border: 1px solid #ccc;">
    </div>"#
        )
    } else {
        String::new()
    };

    let report = narrative
        .map(|r| {
            format!(
                r#"<div style="margin-bottom: 20px;">
      <h3 style="margin: 0 0 10px 0; color: #333; font-size: 18px;">Forensic Report</h3>
      {r}
    </div>"#
            )
        })
        .unwrap_or_default();

    let map_button = content
        .map_link
        .as_deref()
        .map(|link| {
            format!(
                r#"<div style="text-align: center; margin-top: 30px;">
      <a href="{}" style="background-color: #1976d2; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; font-weight: bold;">View Location on Maps</a>
    </div>"#,
                escape_html(link)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; border: 1px solid #e0e0e0; border-radius: 8px; overflow: hidden;">
  <div style="background-color: #d32f2f; color: white; padding: 20px; text-align: center;">
    <h1 style="margin: 0; font-size: 24px;">🚨 CRITICAL ACCIDENT ALERT</h1>
    <p style="margin: 5px 0 0 0; font-size: 14px;">Immediate Attention Required</p>
  </div>
  <div style="padding: 20px;">
    <div style="background-color: #fff3f3; padding: 15px; border-left: 5px solid #d9534f; margin-bottom: 20px;">
      <h3 style="margin: 0 0 10px 0; color: #c62828; font-size: 18px;">Incident Summary</h3>
      <p style="font-size: 16px; color: #333; line-height: 1.6;">{summary}</p>
    </div>
    <table style="width: 100%; border-collapse: collapse; margin-bottom: 20px;">
      <tr style="border-bottom: 1px solid #eee;"><td style="padding: 10px; color: #666;">Time:</td><td style="padding: 10px; font-weight: bold;">{time}</td></tr>
      <tr style="border-bottom: 1px solid #eee;"><td style="padding: 10px; color: #666;">Location:</td><td style="padding: 10px; font-weight: bold;">{location}</td></tr>
      <tr style="border-bottom: 1px solid #eee;"><td style="padding: 10px; color: #666;">Severity:</td><td style="padding: 10px; font-weight: bold; color: #d32f2f;">{severity}</td></tr>
    </table>
    {snapshot}
    {report}
    {map_button}
    <div style="text-align: center; margin-top: 15px;">
      <p style="color: #666; font-size: 12px;">Login to the SmartWay Dashboard for the full forensic report.</p>
    </div>
  </div>
  <div style="background-color: #f5f5f5; padding: 15px; text-align: center; color: #666; font-size: 12px; border-top: 1px solid #e0e0e0;">
    SmartWay Traffic AI • Automated Alert System
  </div>
</div>"#,
        time = content.time_label(),
        location = escape_html(&content.location),
        severity = content.severity.label(),
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
