//! Generative-model configuration.

use std::time::Duration;

/// Default model used for forensic enrichment.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default REST base URL of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound for one enrichment call. The model is the slowest step of an
/// analysis save.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Credentials and tuning for the vision model.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl VisionConfig {
    /// Build a config with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `GEMINI_API_KEY` is unset or empty, which disables
    /// enrichment.
    ///
    /// | Variable              | Required | Default                |
    /// |-----------------------|----------|------------------------|
    /// | `GEMINI_API_KEY`      | yes      | -                      |
    /// | `GEMINI_MODEL`        | no       | `gemini-2.5-flash`     |
    /// | `GEMINI_BASE_URL`     | no       | Generative Language v1beta |
    /// | `GEMINI_TIMEOUT_SECS` | no       | `60`                   |
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        Some(config)
    }
}
