use std::sync::Arc;

use smartway_pipeline::AnalysisOrchestrator;
use smartway_vision::DetectorClient;

use crate::config::ServerConfig;

/// Handles every SmartWay handler needs, behind `State<AppState>`.
///
/// Upload handlers talk to the detector and the pool directly. Analysis
/// saves go through the orchestrator, which owns the vision model, the
/// alert channels and the per-video save locks.
#[derive(Clone)]
pub struct AppState {
    pub pool: smartway_db::DbPool,
    /// Upload and snapshot directories, detector URL, timeouts.
    pub config: Arc<ServerConfig>,
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub detector: DetectorClient,
}
