//! Scalar aliases shared by every SmartWay crate.

/// Key of `videos`, `traffic_logs` and `alert_messages` rows (`BIGSERIAL`).
pub type DbId = i64;

/// Stored as `TIMESTAMPTZ` and always handled in UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
