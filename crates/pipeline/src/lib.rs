//! Analysis update orchestration.
//!
//! [`AnalysisOrchestrator::save_analysis`] takes a raw detector summary for
//! one video through enrichment, merge, persistence, classification and
//! alert dispatch. Collaborators (store, vision model, transports) are
//! injected so the whole flow runs in tests without a database or network.

pub mod error;
pub mod error_sink;
pub mod locks;
pub mod orchestrator;
pub mod stage;
pub mod store;

pub use error::PipelineError;
pub use error_sink::ErrorSink;
pub use locks::VideoLocks;
pub use orchestrator::{
    AnalysisOrchestrator, AnalysisOutcome, SaveAnalysisRequest, NOT_GENERATED_NARRATIVE,
};
pub use stage::AnalysisStage;
pub use store::{AnalysisStore, PgAnalysisStore};
