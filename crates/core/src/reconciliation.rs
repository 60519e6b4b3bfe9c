//! Vehicle-count and emergency-flag reconciliation.
//!
//! Derives one trustworthy total and one emergency boolean from a summary
//! whose values come from an upstream detector and an untrusted model.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::summary::{AnalysisSummary, SummaryValue};

/// Largest count accepted from a single field. Anything with ten or more
/// digits is treated as a corrupted value.
pub const MAX_PLAUSIBLE_COUNT: i64 = 999_999_999;

/// Words that mark a summary as an emergency wherever they appear.
pub const EMERGENCY_PATTERN: &str = r"(?i)ambulance|firetruck|police|accident";

static EMERGENCY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMERGENCY_PATTERN).expect("valid regex"));

/// Result of reconciling one summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Total vehicles seen. Never negative.
    pub total_vehicle_count: i64,
    /// Whether any emergency indicator is present.
    pub has_emergency: bool,
}

/// Reconcile a summary into a vehicle total and an emergency flag.
///
/// The explicit `count` key wins when it is a plausible non-negative
/// integer. Otherwise every plausible numeric value is summed; `count`
/// itself is left out of that sum because it already failed the guard.
pub fn reconcile(summary: &AnalysisSummary) -> Reconciliation {
    let total_vehicle_count = match summary.count.as_ref().and_then(plausible_count) {
        Some(count) => count,
        None => sum_numeric(summary),
    };

    Reconciliation {
        total_vehicle_count,
        has_emergency: detect_emergency(summary),
    }
}

/// Case-insensitive keyword search over the serialized summary, or a literal
/// `ACCIDENT` key.
pub fn detect_emergency(summary: &AnalysisSummary) -> bool {
    summary.accident.is_some() || EMERGENCY_RE.is_match(&summary.serialized())
}

fn plausible_count(value: &SummaryValue) -> Option<i64> {
    value
        .as_count()
        .filter(|n| (0..=MAX_PLAUSIBLE_COUNT).contains(n))
}

fn sum_numeric(summary: &AnalysisSummary) -> i64 {
    summary
        .accident
        .iter()
        .chain(summary.categories.values())
        .filter_map(plausible_count)
        .fold(0i64, |acc, n| acc.saturating_add(n))
}
