use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imgedit_api::config::ServerConfig;
use imgedit_api::router::build_app_router;
use imgedit_api::state::AppState;
use imgedit_engine::EngineApi;
use imgedit_events::WebhookNotifier;
use imgedit_pipeline::{ConversationService, ImagePipeline};
use imgedit_store::{SessionStore, TaskStore};
use imgedit_worker::{RunnerDeps, TaskRunner};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imgedit_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
    })?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        engine_url = %config.engine.url,
        output_dir = %config.images.output_dir.display(),
        "Loaded server configuration",
    );

    // --- Conversation engine + image pipeline ---
    let engine = Arc::new(EngineApi::new(config.engine.clone())?);
    let images = ImagePipeline::new(config.images.clone())?;
    let sessions = Arc::new(SessionStore::new());
    let conversation = Arc::new(ConversationService::new(engine, sessions, images));

    // --- Task runner ---
    let notifier = Arc::new(WebhookNotifier::new(config.webhook.clone())?);
    let (runner, worker_handles) = TaskRunner::start(
        config.runner.clone(),
        RunnerDeps {
            tasks: Arc::new(TaskStore::new()),
            conversation: Arc::clone(&conversation),
            notifier,
        },
    );

    // --- App state + router ---
    let state = AppState {
        conversation,
        runner: Arc::new(runner),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(config.host.parse::<IpAddr>()?, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Post-shutdown cleanup ---
    // Dropping the router released the last runner handle and closed the queue.
    tracing::info!(
        workers = worker_handles.len(),
        "Server stopped accepting connections, draining task queue"
    );
    let drain = join_workers(worker_handles);
    match tokio::time::timeout(Duration::from_secs(config.shutdown_timeout_secs), drain).await {
        Ok(()) => tracing::info!("Task workers stopped"),
        Err(_) => tracing::warn!(
            timeout_secs = config.shutdown_timeout_secs,
            "Task workers did not drain in time, abandoning queued tasks"
        ),
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

async fn join_workers(handles: Vec<tokio::task::JoinHandle<()>>) {
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Task worker ended abnormally");
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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
