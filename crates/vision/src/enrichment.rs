//! Forensic enrichment: prompt, call, decode, degrade.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use smartway_core::summary::AnalysisSummary;

use crate::client::{InlineImage, VisionError, VisionModel};
use crate::decode::{decode_model_output, VisionCorrection};
use crate::prompt::build_forensic_prompt;

/// Wraps a [`VisionModel`] with the enrichment contract.
///
/// [`enrich`](Self::enrich) never returns an error: call failures, timeouts,
/// and undecodable responses all degrade to a [`VisionCorrection`] carrying
/// a textual fallback, so the base summary is always persisted.
#[derive(Clone)]
pub struct ForensicEnricher {
    model: Arc<dyn VisionModel>,
    timeout: Duration,
}

impl ForensicEnricher {
    pub fn new(model: Arc<dyn VisionModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Cross-check `summary` with the model, attaching the snapshot at
    /// `snapshot` when it can be read.
    pub async fn enrich(
        &self,
        summary: &AnalysisSummary,
        snapshot: Option<&Path>,
    ) -> VisionCorrection {
        let image = match snapshot {
            Some(path) => load_snapshot(path).await,
            None => None,
        };
        if image.is_none() {
            tracing::info!(
                model = self.model.model_name(),
                "Generating text-only report (no snapshot)"
            );
        }

        let prompt = build_forensic_prompt(summary, image.is_some());

        let call = self.model.generate(&prompt, image.as_ref());
        let raw = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::error!(
                    error = %e,
                    model = self.model.model_name(),
                    "Vision model call failed"
                );
                return VisionCorrection::failed(e);
            }
            Err(_) => {
                let e = VisionError::Timeout(self.timeout.as_secs());
                tracing::error!(
                    error = %e,
                    model = self.model.model_name(),
                    "Vision model call failed"
                );
                return VisionCorrection::failed(e);
            }
        };

        match decode_model_output(&raw) {
            Ok(correction) => {
                tracing::info!(
                    model = self.model.model_name(),
                    has_report = correction.html_report.is_some(),
                    has_sms = correction.sms_summary.is_some(),
                    "Vision report generated"
                );
                correction
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to decode vision model output, using raw text");
                VisionCorrection::unparsed(&raw)
            }
        }
    }
}

/// Read a snapshot for inline attachment. A missing or unreadable file is
/// not an error; the request simply goes out text-only.
pub async fn load_snapshot(path: &Path) -> Option<InlineImage> {
    match tokio::fs::read(path).await {
        Ok(data) => Some(InlineImage {
            mime_type: InlineImage::mime_type_for_path(path).to_string(),
            data,
        }),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Snapshot not readable");
            None
        }
    }
}
