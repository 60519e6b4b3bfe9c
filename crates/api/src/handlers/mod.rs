pub mod alerts;
pub mod logs;
pub mod video;
