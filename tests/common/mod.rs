#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use sttd::transcription::{PollPolicy, Transcriber, TranscriptionConfig, TranscriptionError};

pub const TEST_API_KEY: &str = "test-key";
pub const UPLOAD_URL: &str = "https://cdn.assemblyai.test/upload/abc123";
pub const JOB_ID: &str = "job-42";

pub type Reply = (u16, String);

pub fn ok_upload() -> Reply {
    (200, json!({ "upload_url": UPLOAD_URL }).to_string())
}

pub fn ok_submit() -> Reply {
    (200, json!({ "id": JOB_ID, "status": "queued" }).to_string())
}

pub fn pending(status: &str) -> Reply {
    (200, json!({ "id": JOB_ID, "status": status, "text": null }).to_string())
}

pub fn completed(text: &str) -> Reply {
    (200, json!({ "id": JOB_ID, "status": "completed", "text": text }).to_string())
}

pub fn failed(error: &str) -> Reply {
    (200, json!({ "id": JOB_ID, "status": "error", "error": error }).to_string())
}

/// Canned replies per endpoint. The last reply in each queue repeats.
pub struct Script {
    pub upload: VecDeque<Reply>,
    pub submit: VecDeque<Reply>,
    pub poll: VecDeque<Reply>,
}

impl Script {
    pub fn new(poll: Vec<Reply>) -> Self {
        Self {
            upload: VecDeque::from([ok_upload()]),
            submit: VecDeque::from([ok_submit()]),
            poll: poll.into(),
        }
    }

    pub fn with_upload(mut self, upload: Vec<Reply>) -> Self {
        self.upload = upload.into();
        self
    }

    pub fn with_submit(mut self, submit: Vec<Reply>) -> Self {
        self.submit = submit.into();
        self
    }
}

#[derive(Default)]
pub struct Calls {
    pub uploads: AtomicUsize,
    pub submits: AtomicUsize,
    pub polls: AtomicUsize,
    pub upload_bodies: Mutex<Vec<Vec<u8>>>,
    pub submit_bodies: Mutex<Vec<Value>>,
    pub polled_ids: Mutex<Vec<String>>,
}

impl Calls {
    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

struct MockState {
    script: Mutex<Script>,
    calls: Arc<Calls>,
}

/// A local stand-in for the AssemblyAI v2 API.
pub struct MockAssemblyAi {
    pub base_url: String,
    pub calls: Arc<Calls>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl Drop for MockAssemblyAi {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            tx.send(()).ok();
        }
    }
}

pub async fn start_mock_assemblyai(script: Script) -> MockAssemblyAi {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let calls = Arc::new(Calls::default());
    let state = Arc::new(MockState {
        script: Mutex::new(script),
        calls: Arc::clone(&calls),
    });

    let app = Router::new()
        .route("/v2/upload", post(mock_upload))
        .route("/v2/transcript", post(mock_submit))
        .route("/v2/transcript/{id}", get(mock_poll))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .ok();
    });

    MockAssemblyAi {
        base_url: format!("http://{}/v2", addr),
        calls,
        shutdown_tx: Some(shutdown_tx),
    }
}

fn next_reply(queue: &mut VecDeque<Reply>) -> Reply {
    if queue.len() > 1 {
        queue.pop_front().unwrap()
    } else {
        queue
            .front()
            .cloned()
            .unwrap_or_else(|| (500, r#"{"error":"no scripted reply"}"#.to_string()))
    }
}

fn reply((status, body): Reply) -> Response {
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

fn unauthorized(headers: &HeaderMap) -> Option<Response> {
    let key = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    (key != Some(TEST_API_KEY))
        .then(|| reply((401, r#"{"error":"Authentication error, API token missing/invalid"}"#.to_string())))
}

async fn mock_upload(State(state): State<Arc<MockState>>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(rejection) = unauthorized(&headers) {
        return rejection;
    }
    state.calls.uploads.fetch_add(1, Ordering::SeqCst);
    state.calls.upload_bodies.lock().unwrap().push(body.to_vec());
    let next = next_reply(&mut state.script.lock().unwrap().upload);
    reply(next)
}

async fn mock_submit(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(rejection) = unauthorized(&headers) {
        return rejection;
    }
    state.calls.submits.fetch_add(1, Ordering::SeqCst);
    state.calls.submit_bodies.lock().unwrap().push(body);
    let next = next_reply(&mut state.script.lock().unwrap().submit);
    reply(next)
}

async fn mock_poll(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
) -> Response {
    if let Some(rejection) = unauthorized(&headers) {
        return rejection;
    }
    state.calls.polls.fetch_add(1, Ordering::SeqCst);
    state.calls.polled_ids.lock().unwrap().push(id);
    let next = next_reply(&mut state.script.lock().unwrap().poll);
    reply(next)
}

/// Client settings pointed at the mock, with millisecond waits.
pub fn test_config(base_url: &str) -> TranscriptionConfig {
    let mut config = TranscriptionConfig::new(TEST_API_KEY)
        .with_base_url(base_url)
        .with_poll_policy(PollPolicy::fixed(Duration::from_millis(10)).with_max_attempts(20));
    config.upload_retry_delay = Duration::from_millis(10);
    config
}

pub const BOUNDARY: &str = "sttd-test-boundary";

pub enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File { name, filename, data } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: audio/webm\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}").as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload-audio")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

/// What the stub saw for one call.
#[derive(Debug, Clone)]
pub struct SeenUpload {
    pub path: PathBuf,
    pub data: Vec<u8>,
}

type CannedResult = Box<dyn Fn() -> Result<String, TranscriptionError> + Send + Sync>;

/// Transcriber that records the file it was given and answers with a canned result.
pub struct StubTranscriber {
    reply: CannedResult,
    pub seen: Mutex<Vec<SeenUpload>>,
}

impl StubTranscriber {
    pub fn replying(reply: impl Fn() -> Result<String, TranscriptionError> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<SeenUpload> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, TranscriptionError> {
        let data = tokio::fs::read(audio_path).await?;
        self.seen.lock().unwrap().push(SeenUpload {
            path: audio_path.to_path_buf(),
            data,
        });
        (self.reply)()
    }
}
