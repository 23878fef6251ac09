//! Shared fixtures: a local image host and a scripted conversation engine.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use imgedit_core::engine::{
    ConversationEngine, EngineError, EngineOutput, EngineRequest, ImageKind, ProducedImage,
};
use imgedit_pipeline::{ImagePipeline, PipelineConfig};
use tokio::sync::Mutex;

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake";

/// Request log of the image host: `(path, cookie header)`.
#[derive(Clone, Default)]
pub struct ImageHost {
    pub hits: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

/// Serves `/img/{name}`:
///
/// - `missing*` -> 404
/// - `*.jpg` -> `image/jpeg`
/// - anything else -> `image/png; charset=binary`, body = name bytes for
///   `echo*`, otherwise [`PNG_BYTES`]
async fn serve_image(
    State(host): State<ImageHost>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    host.hits.lock().await.push((name.clone(), cookie));

    if name.starts_with("missing") {
        return StatusCode::NOT_FOUND.into_response();
    }
    if name.ends_with(".jpg") {
        return ([(header::CONTENT_TYPE, "image/jpeg")], b"jpeg".to_vec()).into_response();
    }
    let body = if name.starts_with("echo") {
        name.into_bytes()
    } else {
        PNG_BYTES.to_vec()
    };
    ([(header::CONTENT_TYPE, "image/png; charset=binary")], body).into_response()
}

/// Start the image host; returns its base URL (`http://127.0.0.1:port`).
pub async fn spawn_image_host() -> (String, ImageHost) {
    let host = ImageHost::default();
    let app = Router::new()
        .route("/img/{name}", get(serve_image))
        .with_state(host.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), host)
}

pub fn pipeline(output_dir: &std::path::Path, base_url: Option<&str>) -> ImagePipeline {
    ImagePipeline::new(PipelineConfig {
        output_dir: output_dir.to_path_buf(),
        base_url: base_url.map(str::to_string),
        proxy: None,
        ..Default::default()
    })
    .unwrap()
}

/// What the fake engine saw on one call.
#[derive(Debug, Clone)]
pub struct SeenCall {
    pub request: EngineRequest,
    /// Contents of every input file at call time.
    pub file_bytes: Vec<Vec<u8>>,
}

/// Scripted engine.
///
/// Prompt `"quota"` fails with `QuotaExceeded`. Any other prompt answers with
/// `text = "echo: {prompt}"`, metadata `[cid-{n}, rid-{n}]` (n = call count)
/// and one generated image per entry in `images`.
pub struct FakeEngine {
    pub calls: Mutex<Vec<SeenCall>>,
    pub images: Vec<String>,
}

impl FakeEngine {
    pub fn new(images: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            images,
        })
    }
}

#[async_trait]
impl ConversationEngine for FakeEngine {
    async fn send(&self, request: EngineRequest) -> Result<EngineOutput, EngineError> {
        let file_bytes = request
            .files
            .iter()
            .map(|p| std::fs::read(p).unwrap())
            .collect();
        let mut calls = self.calls.lock().await;
        calls.push(SeenCall {
            request: request.clone(),
            file_bytes,
        });
        let n = calls.len();

        if request.prompt == "quota" {
            return Err(EngineError::QuotaExceeded("daily cap reached".into()));
        }

        Ok(EngineOutput {
            text: format!("echo: {}", request.prompt),
            metadata: vec![Some(format!("cid-{n}")), Some(format!("rid-{n}"))],
            images: self
                .images
                .iter()
                .map(|url| ProducedImage {
                    url: url.clone(),
                    title: "Generated".into(),
                    alt: "a picture".into(),
                    kind: ImageKind::Generated,
                    cookies: Some(HashMap::from([("SID".to_string(), "abc".to_string())])),
                })
                .collect(),
            thoughts: None,
        })
    }
}
