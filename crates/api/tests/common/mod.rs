#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use smartway_api::config::ServerConfig;
use smartway_api::router::build_app_router;
use smartway_api::state::AppState;
use smartway_events::AlertDispatcher;
use smartway_pipeline::{AnalysisOrchestrator, AnalysisStore, ErrorSink, PgAnalysisStore};
use smartway_vision::DetectorClient;

pub const BOUNDARY: &str = "smartway-test-boundary";

/// Nothing listens on the discard port, so detector calls fail fast.
const UNREACHABLE_DETECTOR: &str = "http://127.0.0.1:9";

/// Build a test `ServerConfig` whose directories live under `dir`.
pub fn test_config(dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_dir: dir.join("uploads"),
        snapshot_dir: dir.join("uploads"),
        db_error_log: dir.join("db_errors.txt"),
        detector_url: UNREACHABLE_DETECTOR.to_string(),
    }
}

/// The router plus the temp directory backing its uploads. Keep the
/// directory alive for the duration of the test.
pub struct TestApp {
    pub router: Router,
    pub dir: TempDir,
    pub config: ServerConfig,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn upload_path(&self, filepath: &str) -> std::path::PathBuf {
        self.config.upload_dir.join(filepath)
    }
}

/// Build the full application router (same middleware stack as `main.rs`)
/// with no vision model and no notification channels configured.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let store: Arc<dyn AnalysisStore> = Arc::new(PgAnalysisStore::new(pool.clone()));
    let orchestrator = AnalysisOrchestrator::new(
        store,
        None,
        AlertDispatcher::default(),
        ErrorSink::new(config.db_error_log.clone()),
    )
    .with_snapshot_dir(config.snapshot_dir.clone());

    let detector = DetectorClient::new(&config.detector_url, Duration::from_secs(5)).unwrap();

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        orchestrator: Arc::new(orchestrator),
        detector,
    };

    TestApp {
        router: build_app_router(state, &config),
        dir,
        config,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Body::empty(), None).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Body::empty(), None).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(
        app,
        Method::PUT,
        uri,
        Body::from(body.to_string()),
        Some("application/json".to_string()),
    )
    .await
}

/// PUT a body verbatim with a JSON content type, valid or not.
pub async fn put_raw_json(app: Router, uri: &str, body: &str) -> Response<Body> {
    send(
        app,
        Method::PUT,
        uri,
        Body::from(body.to_string()),
        Some("application/json".to_string()),
    )
    .await
}

/// POST a multipart body built by [`multipart_body`].
pub async fn post_multipart(app: Router, uri: &str, body: Vec<u8>) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        Body::from(body),
        Some(format!("multipart/form-data; boundary={BOUNDARY}")),
    )
    .await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Body,
    content_type: Option<String>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(ct) = content_type {
        builder = builder.header("content-type", ct);
    }
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Encode text fields and an optional `video` file as multipart/form-data.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"video\"; filename=\"{filename}\"\r\nContent-Type: video/mp4\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
