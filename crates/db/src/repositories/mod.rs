//! Repository layer: one struct per table.

pub mod alert_message_repo;
pub mod traffic_log_repo;
pub mod video_repo;

pub use alert_message_repo::AlertMessageRepo;
pub use traffic_log_repo::TrafficLogRepo;
pub use video_repo::VideoRepo;
