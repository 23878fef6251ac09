//! Shared harness for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use imgedit_api::config::ServerConfig;
use imgedit_api::router::build_app_router;
use imgedit_api::state::AppState;
use imgedit_core::engine::{ConversationEngine, EngineError, EngineOutput, EngineRequest};
use imgedit_engine::EngineConfig;
use imgedit_events::WebhookConfig;
use imgedit_pipeline::{ConversationService, ImagePipeline, PipelineConfig};
use imgedit_store::{SessionStore, TaskStore};
use imgedit_worker::{RunnerConfig, RunnerDeps, TaskRunner};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

/// Engine double: `"quota"` fails with `QuotaExceeded`, every other prompt
/// is echoed back with a fresh continuation cursor.
pub struct EchoEngine {
    pub calls: Mutex<Vec<EngineRequest>>,
}

#[async_trait]
impl ConversationEngine for EchoEngine {
    async fn send(&self, request: EngineRequest) -> Result<EngineOutput, EngineError> {
        let mut calls = self.calls.lock().await;
        calls.push(request.clone());
        if request.prompt == "quota" {
            return Err(EngineError::QuotaExceeded("daily cap reached".into()));
        }
        Ok(EngineOutput {
            text: format!("echo: {}", request.prompt),
            metadata: vec![Some(format!("cid-{}", calls.len()))],
            images: vec![],
            thoughts: None,
        })
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(output_dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        engine: EngineConfig::new("http://127.0.0.1:1"),
        images: PipelineConfig {
            output_dir: output_dir.to_path_buf(),
            base_url: None,
            proxy: None,
            ..Default::default()
        },
        runner: RunnerConfig {
            workers: 2,
            queue_capacity: 8,
            webhook_max_attempts: 3,
        },
        webhook: WebhookConfig {
            request_timeout: Duration::from_secs(5),
            base_delay: Duration::from_millis(10),
            max_attempts: 3,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub engine: Arc<EchoEngine>,
    pub sessions: Arc<SessionStore>,
    pub tasks: Arc<TaskStore>,
    pub output_dir: tempfile::TempDir,
}

/// Build the full application router, wired to [`EchoEngine`], with the
/// same middleware stack production uses.
pub fn build_test_app() -> TestApp {
    build_test_app_with(|_| {})
}

pub fn build_test_app_with(tweak: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let output_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(output_dir.path());
    tweak(&mut config);

    let engine = Arc::new(EchoEngine {
        calls: Mutex::new(Vec::new()),
    });
    let sessions = Arc::new(SessionStore::new());
    let tasks = Arc::new(TaskStore::new());
    let conversation = Arc::new(ConversationService::new(
        engine.clone(),
        sessions.clone(),
        ImagePipeline::new(config.images.clone()).unwrap(),
    ));
    let notifier = Arc::new(imgedit_events::WebhookNotifier::new(config.webhook.clone()).unwrap());
    let (runner, _handles) = TaskRunner::start(
        config.runner.clone(),
        RunnerDeps {
            tasks: tasks.clone(),
            conversation: conversation.clone(),
            notifier,
        },
    );

    let state = AppState {
        conversation,
        runner: Arc::new(runner),
    };

    TestApp {
        router: build_app_router(state, &config),
        engine,
        sessions,
        tasks,
        output_dir,
    }
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Records webhook bodies and answers 200.
#[derive(Clone, Default)]
pub struct Hooks {
    pub received: Arc<Mutex<Vec<Value>>>,
}

impl Hooks {
    /// Wait until at least `n` webhooks arrived, then return them all.
    pub async fn wait_for(&self, n: usize) -> Vec<Value> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            {
                let received = self.received.lock().await;
                if received.len() >= n {
                    return received.clone();
                }
            }
            assert!(tokio::time::Instant::now() < deadline, "timed out waiting for webhooks");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

async fn receive(State(hooks): State<Hooks>, Json(body): Json<Value>) -> StatusCode {
    hooks.received.lock().await.push(body);
    StatusCode::OK
}

pub async fn spawn_hooks() -> (String, Hooks) {
    let hooks = Hooks::default();
    let app = Router::new()
        .route("/hook", post(receive))
        .with_state(hooks.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/hook"), hooks)
}
