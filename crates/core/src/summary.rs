//! Typed view over the detector's per-video analysis summary.
//!
//! The upstream detector emits a flat JSON object mapping detection
//! categories (`"car"`, `"ambulance"`, `"ACCIDENT"`, ...) to counts, plus an
//! optional `alerts` list. Categories vary per video, so the summary stays an
//! open map, but the three keys the pipeline actually inspects are pulled
//! into named fields:
//!
//! | Key        | Field                          |
//! |------------|--------------------------------|
//! | `count`    | [`AnalysisSummary::count`]     |
//! | `ACCIDENT` | [`AnalysisSummary::accident`]  |
//! | `alerts`   | [`AnalysisSummary::alerts`]    |
//!
//! Every other key lands in [`AnalysisSummary::categories`]. Values are
//! classified exactly once, at ingestion, into [`SummaryValue::Numeric`] or
//! [`SummaryValue::NonNumeric`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Explicit total supplied by some detector versions.
pub const KEY_COUNT: &str = "count";

/// Reserved key holding the list of human-readable alert strings.
pub const KEY_ALERTS: &str = "alerts";

/// Category key set by the detector or the vision model when a crash is seen.
pub const KEY_ACCIDENT: &str = "ACCIDENT";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Reasons a raw JSON value cannot be read as an [`AnalysisSummary`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummaryError {
    /// The top-level value was not a JSON object.
    #[error("analysis summary must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// `alerts` was present but neither a string nor a list of strings.
    #[error("`alerts` must be a list of strings")]
    InvalidAlerts,
}

// ---------------------------------------------------------------------------
// SummaryValue
// ---------------------------------------------------------------------------

/// A single summary value after the ingestion-time numeric parse.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryValue {
    /// A whole number: a JSON integer, an integral float, or a string made
    /// only of ASCII digits.
    Numeric(i64),
    /// Anything else (booleans, objects, free text, fractional ratios).
    /// Kept verbatim so it is persisted unchanged.
    NonNumeric(Value),
}

impl SummaryValue {
    /// Classify a raw JSON value.
    pub fn classify(value: Value) -> Self {
        match &value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Self::Numeric(i);
                }
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Self::Numeric(f as i64)
                    }
                    _ => Self::NonNumeric(value),
                }
            }
            Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                match s.parse::<i64>() {
                    Ok(i) => Self::Numeric(i),
                    Err(_) => Self::NonNumeric(value),
                }
            }
            _ => Self::NonNumeric(value),
        }
    }

    /// The integer value, if this entry is numeric.
    pub fn as_count(&self) -> Option<i64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::NonNumeric(_) => None,
        }
    }

    /// JavaScript-style truthiness, which is how the detector and the model
    /// flag categories (`1`, `true`, `"yes"` all mean present).
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Numeric(n) => *n != 0,
            Self::NonNumeric(value) => match value {
                Value::Null => false,
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
                Value::String(s) => !s.is_empty(),
                Value::Array(_) | Value::Object(_) => true,
            },
        }
    }

    /// Render back to JSON. Digit strings come back as numbers.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Numeric(n) => Value::from(*n),
            Self::NonNumeric(value) => value.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisSummary
// ---------------------------------------------------------------------------

/// Per-video detection summary with reserved keys lifted into fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct AnalysisSummary {
    /// The `count` key, if present.
    pub count: Option<SummaryValue>,
    /// The `ACCIDENT` key, if present.
    pub accident: Option<SummaryValue>,
    /// The `alerts` list, de-duplicated in first-seen order.
    pub alerts: Option<Vec<String>>,
    /// Every other detection category.
    pub categories: BTreeMap<String, SummaryValue>,
}

impl AnalysisSummary {
    /// Parse a raw JSON value received from the detector, the dashboard, or
    /// the vision model.
    pub fn from_value(value: Value) -> Result<Self, SummaryError> {
        let map = match value {
            Value::Object(map) => map,
            other => return Err(SummaryError::NotAnObject(json_kind(&other))),
        };

        let mut summary = Self::default();
        for (key, value) in map {
            match key.as_str() {
                KEY_COUNT => summary.count = Some(SummaryValue::classify(value)),
                KEY_ACCIDENT => summary.accident = Some(SummaryValue::classify(value)),
                KEY_ALERTS => summary.alerts = parse_alerts(value)?,
                _ => {
                    summary.categories.insert(key, SummaryValue::classify(value));
                }
            }
        }
        Ok(summary)
    }

    /// Render the summary as the JSON object persisted to the database.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (key, value) in &self.categories {
            map.insert(key.clone(), value.to_json());
        }
        if let Some(count) = &self.count {
            map.insert(KEY_COUNT.to_string(), count.to_json());
        }
        if let Some(accident) = &self.accident {
            map.insert(KEY_ACCIDENT.to_string(), accident.to_json());
        }
        if let Some(alerts) = &self.alerts {
            map.insert(
                KEY_ALERTS.to_string(),
                Value::Array(alerts.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(map)
    }

    /// Compact JSON text of the summary.
    pub fn serialized(&self) -> String {
        self.to_value().to_string()
    }

    /// `true` when no key at all is present.
    pub fn is_empty(&self) -> bool {
        self.count.is_none()
            && self.accident.is_none()
            && self.alerts.is_none()
            && self.categories.is_empty()
    }

    /// Look up a non-reserved detection category.
    pub fn category(&self, name: &str) -> Option<&SummaryValue> {
        self.categories.get(name)
    }

    /// Whether the `ACCIDENT` key is present with a truthy value.
    pub fn accident_flagged(&self) -> bool {
        self.accident.as_ref().is_some_and(SummaryValue::is_truthy)
    }

    /// Number of vehicles the `ACCIDENT` entry reports, if it is numeric.
    pub fn accident_count(&self) -> Option<i64> {
        self.accident.as_ref().and_then(SummaryValue::as_count)
    }

    /// Apply corrections on top of this summary.
    ///
    /// Keys present in `corrections` overwrite existing ones, except
    /// `alerts`, which is unioned as a set so no alert string appears twice.
    pub fn merge(&mut self, corrections: AnalysisSummary) {
        let AnalysisSummary {
            count,
            accident,
            alerts,
            categories,
        } = corrections;

        if count.is_some() {
            self.count = count;
        }
        if accident.is_some() {
            self.accident = accident;
        }
        if let Some(incoming) = alerts {
            let existing = self.alerts.get_or_insert_with(Vec::new);
            for alert in incoming {
                if !existing.contains(&alert) {
                    existing.push(alert);
                }
            }
        }
        self.categories.extend(categories);
    }
}

impl TryFrom<Value> for AnalysisSummary {
    type Error = SummaryError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<AnalysisSummary> for Value {
    fn from(summary: AnalysisSummary) -> Self {
        summary.to_value()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_alerts(value: Value) -> Result<Option<Vec<String>>, SummaryError> {
    let raw = match value {
        Value::Null => return Ok(None),
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(SummaryError::InvalidAlerts),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(SummaryError::InvalidAlerts),
    };

    let mut alerts: Vec<String> = Vec::with_capacity(raw.len());
    for alert in raw {
        if !alerts.contains(&alert) {
            alerts.push(alert);
        }
    }
    Ok(Some(alerts))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn summary(value: Value) -> AnalysisSummary {
        AnalysisSummary::from_value(value).unwrap()
    }

    // -- classification --

    #[test]
    fn integers_and_digit_strings_are_numeric() {
        assert_eq!(SummaryValue::classify(json!(7)), SummaryValue::Numeric(7));
        assert_eq!(SummaryValue::classify(json!("12")), SummaryValue::Numeric(12));
        assert_eq!(SummaryValue::classify(json!(4.0)), SummaryValue::Numeric(4));
    }

    #[test]
    fn other_values_are_non_numeric() {
        assert_matches!(SummaryValue::classify(json!(true)), SummaryValue::NonNumeric(_));
        assert_matches!(SummaryValue::classify(json!("12a")), SummaryValue::NonNumeric(_));
        assert_matches!(SummaryValue::classify(json!("")), SummaryValue::NonNumeric(_));
        assert_matches!(SummaryValue::classify(json!(0.45)), SummaryValue::NonNumeric(_));
        assert_matches!(SummaryValue::classify(json!({"a": 1})), SummaryValue::NonNumeric(_));
    }

    #[test]
    fn fractional_count_is_kept_verbatim() {
        assert_eq!(
            SummaryValue::classify(json!(2.5)),
            SummaryValue::NonNumeric(json!(2.5))
        );
        assert_eq!(SummaryValue::classify(json!(2.5)).as_count(), None);
    }

    #[test]
    fn overflowing_digit_string_stays_text() {
        let huge = "9".repeat(30);
        assert_matches!(
            SummaryValue::classify(json!(huge)),
            SummaryValue::NonNumeric(Value::String(_))
        );
    }

    #[test]
    fn truthiness_follows_json_semantics() {
        assert!(SummaryValue::Numeric(1).is_truthy());
        assert!(!SummaryValue::Numeric(0).is_truthy());
        assert!(!SummaryValue::NonNumeric(json!(false)).is_truthy());
        assert!(!SummaryValue::NonNumeric(json!("")).is_truthy());
        assert!(!SummaryValue::NonNumeric(Value::Null).is_truthy());
        assert!(SummaryValue::NonNumeric(json!("yes")).is_truthy());
    }

    // -- parsing --

    #[test]
    fn reserved_keys_are_lifted() {
        let s = summary(json!({
            "car": 3,
            "count": "5",
            "ACCIDENT": 1,
            "alerts": ["Congestion"]
        }));
        assert_eq!(s.count, Some(SummaryValue::Numeric(5)));
        assert_eq!(s.accident, Some(SummaryValue::Numeric(1)));
        assert_eq!(s.alerts, Some(vec!["Congestion".to_string()]));
        assert_eq!(s.category("car"), Some(&SummaryValue::Numeric(3)));
        assert!(s.category("count").is_none());
    }

    #[test]
    fn non_object_is_rejected() {
        assert_eq!(
            AnalysisSummary::from_value(json!([1, 2])).unwrap_err(),
            SummaryError::NotAnObject("an array")
        );
        assert_matches!(
            AnalysisSummary::from_value(Value::Null),
            Err(SummaryError::NotAnObject("null"))
        );
    }

    #[test]
    fn alerts_are_deduplicated_on_ingestion() {
        let s = summary(json!({"alerts": ["Fire", "Fire", "Smoke"]}));
        assert_eq!(s.alerts, Some(vec!["Fire".to_string(), "Smoke".to_string()]));
    }

    #[test]
    fn single_alert_string_becomes_list() {
        let s = summary(json!({"alerts": "Fire"}));
        assert_eq!(s.alerts, Some(vec!["Fire".to_string()]));
    }

    #[test]
    fn malformed_alerts_are_rejected() {
        assert_eq!(
            AnalysisSummary::from_value(json!({"alerts": [1, 2]})).unwrap_err(),
            SummaryError::InvalidAlerts
        );
        assert_eq!(
            AnalysisSummary::from_value(json!({"alerts": {"a": "b"}})).unwrap_err(),
            SummaryError::InvalidAlerts
        );
    }

    #[test]
    fn to_value_restores_reserved_keys() {
        let s = summary(json!({"car": "4", "ACCIDENT": 1, "alerts": ["x"], "note": "ok"}));
        assert_eq!(
            s.to_value(),
            json!({"car": 4, "ACCIDENT": 1, "alerts": ["x"], "note": "ok"})
        );
    }

    #[test]
    fn serde_goes_through_the_open_map() {
        let s: AnalysisSummary = serde_json::from_value(json!({"bus": 2})).unwrap();
        assert_eq!(s.category("bus"), Some(&SummaryValue::Numeric(2)));
        assert_eq!(serde_json::to_value(&s).unwrap(), json!({"bus": 2}));
        assert!(serde_json::from_value::<AnalysisSummary>(json!("nope")).is_err());
    }

    #[test]
    fn empty_object_is_empty() {
        assert!(summary(json!({})).is_empty());
        assert!(!summary(json!({"car": 0})).is_empty());
    }

    // -- merge --

    #[test]
    fn merge_unions_alerts_without_duplicates() {
        let mut base = summary(json!({"alerts": ["Fire Accident Detected", "Congestion"]}));
        base.merge(summary(json!({"alerts": ["Fire Accident Detected"]})));

        let alerts = base.alerts.unwrap();
        assert_eq!(alerts.len(), 2);
        assert!(alerts.contains(&"Fire Accident Detected".to_string()));
        assert!(alerts.contains(&"Congestion".to_string()));
    }

    #[test]
    fn merge_adopts_alerts_when_base_has_none() {
        let mut base = summary(json!({"car": 1}));
        base.merge(summary(json!({"alerts": ["Rollover Accident Detected"]})));
        assert_eq!(base.alerts, Some(vec!["Rollover Accident Detected".to_string()]));
    }

    #[test]
    fn merge_overwrites_counts_and_adds_categories() {
        let mut base = summary(json!({"car": 10, "ACCIDENT": 0}));
        base.merge(summary(json!({"car": 9, "ACCIDENT": 1, "police": 1})));
        assert_eq!(base.category("car"), Some(&SummaryValue::Numeric(9)));
        assert_eq!(base.category("police"), Some(&SummaryValue::Numeric(1)));
        assert!(base.accident_flagged());
    }

    #[test]
    fn merge_keeps_keys_absent_from_corrections() {
        let mut base = summary(json!({"count": 4, "truck": 2}));
        base.merge(AnalysisSummary::default());
        assert_eq!(base, summary(json!({"count": 4, "truck": 2})));
    }
}
