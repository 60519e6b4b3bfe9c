//! Clients for the two external AI services the pipeline consumes.
//!
//! - [`ForensicEnricher`] asks a generative vision model to cross-check a
//!   detector summary (optionally against a snapshot) and returns a
//!   [`VisionCorrection`]. It never fails: every error degrades to a
//!   textual fallback.
//! - [`DetectorClient`] triggers the upstream computer-vision service that
//!   produces the initial per-video summary.

pub mod client;
pub mod config;
pub mod decode;
pub mod detector;
pub mod enrichment;
pub mod prompt;

pub use client::{GeminiClient, InlineImage, VisionError, VisionModel};
pub use config::VisionConfig;
pub use decode::{EnrichmentOutcome, VisionCorrection};
pub use detector::{DetectorClient, DetectorError, DetectorResponse};
pub use enrichment::ForensicEnricher;
