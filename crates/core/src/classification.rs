//! Incident classification over a merged (post-enrichment) summary.

use serde::Serialize;

use crate::reconciliation::Reconciliation;
use crate::summary::AnalysisSummary;

/// Label stored in `alert_messages.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IncidentCategory {
    /// A crash was confirmed (`ACCIDENT` is truthy).
    Emergency,
    /// Emergency indicators without a confirmed crash, e.g. an ambulance
    /// stuck in traffic.
    Congestion,
}

impl IncidentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emergency => "Emergency",
            Self::Congestion => "Congestion",
        }
    }
}

impl std::fmt::Display for IncidentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity shown in alert templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Confirmed crash.
    Critical,
    /// Emergency indicators only.
    High,
    /// Nothing that warrants an alert.
    Low,
}

impl Severity {
    /// Upper-case label used in notification bodies.
    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Low => "LOW",
        }
    }
}

/// Everything the orchestrator needs to decide on logging and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IncidentClassification {
    pub total_vehicle_count: i64,
    pub has_emergency: bool,
    pub category: IncidentCategory,
    pub severity: Severity,
}

/// Classify a merged summary.
///
/// `reconciliation` must have been computed over the same merged summary:
/// enrichment can add an `ACCIDENT` key or alert strings the raw input did
/// not carry.
pub fn classify(
    merged: &AnalysisSummary,
    reconciliation: &Reconciliation,
) -> IncidentClassification {
    let category = if merged.accident_flagged() {
        IncidentCategory::Emergency
    } else {
        IncidentCategory::Congestion
    };

    let severity = match (reconciliation.has_emergency, category) {
        (false, _) => Severity::Low,
        (true, IncidentCategory::Emergency) => Severity::Critical,
        (true, IncidentCategory::Congestion) => Severity::High,
    };

    IncidentClassification {
        total_vehicle_count: reconciliation.total_vehicle_count,
        has_emergency: reconciliation.has_emergency,
        category,
        severity,
    }
}
