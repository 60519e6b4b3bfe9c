pub mod alert_message;
pub mod traffic_log;
pub mod video;
