//! Best-effort decoding of the model's response text.
//!
//! The model is asked for a bare JSON object but is not trusted to return
//! one: responses arrive wrapped in markdown fences or surrounded by prose.
//! Decoding strips fences, cuts the text down to the outermost `{...}`, and
//! only then parses.

use serde_json::Value;
use smartway_core::summary::{AnalysisSummary, SummaryError};

/// SMS digest used when the model output could not be decoded.
pub const FALLBACK_SMS_SUMMARY: &str =
    "Alert: Accident / Incident detected. See email for details.";

/// Narrative used when the model answered without an `html_report`.
pub const MISSING_REPORT_NARRATIVE: &str = "AI report was not included in the model response.";

/// Prefix of the narrative recorded when the model call itself failed.
pub const FAILED_REPORT_PREFIX: &str = "AI Analysis Failed: ";

/// Maximum length of an SMS digest, in characters.
pub const MAX_SMS_CHARS: usize = 160;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the correction was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// The response decoded into the three-key contract.
    Decoded,
    /// The model answered but the text was not usable JSON.
    Unparsed,
    /// The call failed (network, auth, quota, timeout).
    Failed,
}

/// The model's structured corrections for one summary.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionCorrection {
    /// Partial summary to merge over the detector output.
    pub updated_data: AnalysisSummary,
    /// HTML-formatted incident narrative.
    pub html_report: Option<String>,
    /// Plain-text digest, at most [`MAX_SMS_CHARS`] characters.
    pub sms_summary: Option<String>,
    pub outcome: EnrichmentOutcome,
}

impl VisionCorrection {
    /// Correction recorded when the model call failed. Nothing is merged.
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self {
            updated_data: AnalysisSummary::default(),
            html_report: Some(format!("{FAILED_REPORT_PREFIX}{error}")),
            sms_summary: None,
            outcome: EnrichmentOutcome::Failed,
        }
    }

    /// Correction recorded when the response text could not be decoded: the
    /// raw text becomes the narrative.
    pub fn unparsed(raw: &str) -> Self {
        Self {
            updated_data: AnalysisSummary::default(),
            html_report: Some(raw.to_string()),
            sms_summary: Some(FALLBACK_SMS_SUMMARY.to_string()),
            outcome: EnrichmentOutcome::Unparsed,
        }
    }

    /// The narrative to store and return, never empty.
    pub fn narrative(&self) -> &str {
        self.html_report
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(MISSING_REPORT_NARRATIVE)
    }
}

/// Why a response could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("model output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model output is not a JSON object")]
    NotAnObject,

    #[error("updated_data is not a valid summary: {0}")]
    UpdatedData(#[from] SummaryError),
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Remove markdown code-fence markers and surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Cut the text down to the span between the first `{` and the last `}`.
/// Text without such a span is returned fence-stripped but otherwise as is.
pub fn extract_json_object(raw: &str) -> String {
    let clean = strip_code_fences(raw);
    match (clean.find('{'), clean.rfind('}')) {
        (Some(start), Some(end)) if start < end => clean[start..=end].to_string(),
        _ => clean,
    }
}

/// Decode raw model text into a [`VisionCorrection`].
pub fn decode_model_output(raw: &str) -> Result<VisionCorrection, DecodeError> {
    let value: Value = serde_json::from_str(&extract_json_object(raw))?;
    let Value::Object(mut object) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let updated_data = match object.remove("updated_data") {
        None | Some(Value::Null) => AnalysisSummary::default(),
        Some(data) => AnalysisSummary::from_value(data)?,
    };

    let html_report = object
        .remove("html_report")
        .and_then(|v| v.as_str().map(str::to_owned));

    let sms_summary = object
        .remove("sms_summary")
        .and_then(|v| v.as_str().map(|s| truncate_chars(s.trim(), MAX_SMS_CHARS)))
        .filter(|s| !s.is_empty());

    Ok(VisionCorrection {
        updated_data,
        html_report,
        sms_summary,
        outcome: EnrichmentOutcome::Decoded,
    })
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
