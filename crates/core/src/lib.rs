//! Domain types and pure logic for the SmartWay traffic incident pipeline.
//!
//! Nothing in this crate performs I/O. It owns the typed
//! [`AnalysisSummary`](summary::AnalysisSummary) open map, vehicle-count
//! reconciliation, incident classification, and the string constants
//! shared with the database and notification layers.

pub mod channels;
pub mod classification;
pub mod error;
pub mod reconciliation;
pub mod summary;
pub mod types;
pub mod video_status;
