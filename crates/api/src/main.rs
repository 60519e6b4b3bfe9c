use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smartway_api::config::ServerConfig;
use smartway_api::router::build_app_router;
use smartway_api::state::AppState;
use smartway_events::{
    AlertDispatcher, EmailConfig, EmailTransport, MessageTransport, SmtpMailer, TwilioWhatsApp,
    WhatsAppConfig,
};
use smartway_pipeline::{AnalysisOrchestrator, AnalysisStore, ErrorSink, PgAnalysisStore};
use smartway_vision::{DetectorClient, ForensicEnricher, GeminiClient, VisionConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "smartway_api=debug,smartway_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = smartway_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    smartway_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    smartway_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Collaborators ---
    let enricher = build_enricher();
    let dispatcher = AlertDispatcher::new(build_mailer(), build_messenger());

    let store: Arc<dyn AnalysisStore> = Arc::new(PgAnalysisStore::new(pool.clone()));
    let orchestrator = AnalysisOrchestrator::new(
        store,
        enricher,
        dispatcher,
        ErrorSink::new(config.db_error_log.clone()),
    )
    .with_snapshot_dir(config.snapshot_dir.clone());

    let detector = DetectorClient::new(
        &config.detector_url,
        Duration::from_secs(config.request_timeout_secs),
    )
    .expect("Failed to build detector client");
    tracing::info!(url = %config.detector_url, "Detector client configured");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        orchestrator: Arc::new(orchestrator),
        detector,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Vision model for forensic enrichment; `None` disables the step.
fn build_enricher() -> Option<ForensicEnricher> {
    let Some(config) = VisionConfig::from_env() else {
        tracing::warn!("GEMINI_API_KEY not set, forensic enrichment disabled");
        return None;
    };
    let timeout = config.timeout;
    let model = config.model.clone();
    match GeminiClient::new(config) {
        Ok(client) => {
            tracing::info!(%model, timeout_secs = timeout.as_secs(), "Forensic enrichment enabled");
            Some(ForensicEnricher::new(Arc::new(client), timeout))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build vision client, enrichment disabled");
            None
        }
    }
}

fn build_mailer() -> Option<Arc<dyn EmailTransport>> {
    let Some(config) = EmailConfig::from_env() else {
        tracing::warn!("EMAIL_USER/EMAIL_PASS not set, email alerts disabled");
        return None;
    };
    match SmtpMailer::new(config) {
        Ok(mailer) => {
            tracing::info!(sender = %mailer.sender(), "Email alerts enabled");
            let transport: Arc<dyn EmailTransport> = Arc::new(mailer);
            Some(transport)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build SMTP transport, email alerts disabled");
            None
        }
    }
}

fn build_messenger() -> Option<Arc<dyn MessageTransport>> {
    let Some(config) = WhatsAppConfig::from_env() else {
        tracing::warn!("Twilio credentials not set, WhatsApp alerts disabled");
        return None;
    };
    match TwilioWhatsApp::new(config) {
        Ok(client) => {
            tracing::info!(destination = %client.destination(), "WhatsApp alerts enabled");
            let transport: Arc<dyn MessageTransport> = Arc::new(client);
            Some(transport)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build Twilio client, WhatsApp alerts disabled");
            None
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
