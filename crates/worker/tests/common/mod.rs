//! Shared fixtures: a scripted engine, a webhook receiver and a runner
//! wired to both.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use imgedit_core::engine::{ConversationEngine, EngineError, EngineOutput, EngineRequest};
use imgedit_events::{WebhookConfig, WebhookNotifier};
use imgedit_pipeline::{ConversationService, ImagePipeline, PipelineConfig};
use imgedit_store::{SessionStore, TaskStore};
use imgedit_worker::{RunnerConfig, RunnerDeps, TaskRunner};
use serde_json::Value;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;

/// Scripted engine, keyed on the prompt:
///
/// - `"quota"` -> `QuotaExceeded`
/// - `"panic"` -> panics
/// - `"block"` -> waits for a permit on `gate`, then answers
/// - anything else -> `"echo: {prompt}"`
pub struct ScriptedEngine {
    pub gate: Semaphore,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Wait until the engine has been called at least `n` times.
    pub async fn wait_for_calls(&self, n: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while self.calls.lock().await.len() < n {
            assert!(
                tokio::time::Instant::now() < deadline,
                "engine saw fewer than {n} calls"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl ConversationEngine for ScriptedEngine {
    async fn send(&self, request: EngineRequest) -> Result<EngineOutput, EngineError> {
        self.calls.lock().await.push(request.prompt.clone());
        match request.prompt.as_str() {
            "quota" => Err(EngineError::QuotaExceeded("daily cap reached".into())),
            "panic" => panic!("engine exploded"),
            "block" => {
                self.gate.acquire().await.unwrap().forget();
                Ok(echo(&request.prompt))
            }
            prompt => Ok(echo(prompt)),
        }
    }
}

fn echo(prompt: &str) -> EngineOutput {
    EngineOutput {
        text: format!("echo: {prompt}"),
        metadata: vec![Some("cid".into()), Some("rid".into())],
        images: vec![],
        thoughts: None,
    }
}

/// Records every webhook body it receives and answers 200.
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
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {n} webhooks"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

async fn receive(State(hooks): State<Hooks>, Json(body): Json<Value>) -> StatusCode {
    hooks.received.lock().await.push(body);
    StatusCode::OK
}

/// Start the webhook receiver; returns its callback URL.
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

pub struct Harness {
    pub runner: TaskRunner,
    pub handles: Vec<JoinHandle<()>>,
    pub tasks: Arc<TaskStore>,
    pub engine: Arc<ScriptedEngine>,
    pub output_dir: tempfile::TempDir,
}

pub fn harness(workers: usize, queue_capacity: usize) -> Harness {
    let engine = ScriptedEngine::new();
    let output_dir = tempfile::tempdir().unwrap();
    let images = ImagePipeline::new(PipelineConfig {
        output_dir: output_dir.path().to_path_buf(),
        base_url: None,
        proxy: None,
        ..Default::default()
    })
    .unwrap();
    let conversation = Arc::new(ConversationService::new(
        engine.clone(),
        Arc::new(SessionStore::new()),
        images,
    ));
    let notifier = Arc::new(
        WebhookNotifier::new(WebhookConfig {
            request_timeout: Duration::from_secs(5),
            base_delay: Duration::from_millis(10),
            max_attempts: 3,
        })
        .unwrap(),
    );
    let tasks = Arc::new(TaskStore::new());

    let (runner, handles) = TaskRunner::start(
        RunnerConfig {
            workers,
            queue_capacity,
            webhook_max_attempts: 3,
        },
        RunnerDeps {
            tasks: tasks.clone(),
            conversation,
            notifier,
        },
    );

    Harness {
        runner,
        handles,
        tasks,
        engine,
        output_dir,
    }
}
