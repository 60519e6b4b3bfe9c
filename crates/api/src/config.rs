use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. Collaborator
/// credentials (vision model, SMTP, Twilio) live in their own config types.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`). Uploads wait for
    /// the detector and analysis saves wait for the vision model.
    pub request_timeout_secs: u64,
    /// Where uploaded videos are stored (default: `uploads`).
    pub upload_dir: PathBuf,
    /// Where detector snapshots are looked up (default: `uploads`).
    pub snapshot_dir: PathBuf,
    /// Append-only file for failed audit writes (default: `db_errors.txt`).
    pub db_error_log: PathBuf,
    /// Base URL of the video detector service.
    pub detector_url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `5000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `120`                      |
    /// | `UPLOAD_DIR`           | `uploads`                  |
    /// | `SNAPSHOT_DIR`         | `uploads`                  |
    /// | `DB_ERROR_LOG`         | `db_errors.txt`            |
    /// | `DETECTOR_URL`         | `http://127.0.0.1:8000`    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let upload_dir = path_var("UPLOAD_DIR", "uploads");
        let snapshot_dir = path_var("SNAPSHOT_DIR", "uploads");
        let db_error_log = path_var("DB_ERROR_LOG", "db_errors.txt");

        let detector_url =
            std::env::var("DETECTOR_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            upload_dir,
            snapshot_dir,
            db_error_log,
            detector_url,
        }
    }
}

fn path_var(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
        .into()
}
