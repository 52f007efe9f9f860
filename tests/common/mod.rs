#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use spleeter_studio::StudioConfig;
use spleeter_studio::backend::bridge::BackendBridge;
use spleeter_studio::backend::error::BridgeError;
use spleeter_studio::common::models::FileMetadata;

// -----------------------------------------------------------------------------------------------
// 假后端

#[derive(Debug, Clone)]
pub enum Reply {
    Json(StatusCode, Value),
    Text(StatusCode, String),
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Reply::Json(StatusCode::OK, body)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(code, body) => (code, Json(body)).into_response(),
            Reply::Text(code, body) => (code, body).into_response(),
        }
    }
}

pub fn processing(progress: f64, step: &str) -> Reply {
    Reply::ok(json!({
        "status": "processing",
        "progress": progress,
        "current_step": step,
        "eta_seconds": 42,
        "error_message": null,
        "output_files": null
    }))
}

pub fn completed(files: &[&str]) -> Reply {
    Reply::ok(json!({
        "status": "completed",
        "progress": 1.0,
        "current_step": "Separation completed!",
        "output_files": files
    }))
}

pub fn failed(message: &str) -> Reply {
    Reply::ok(json!({
        "status": "error",
        "progress": 0.0,
        "current_step": "Error occurred",
        "error_message": message,
        "output_files": []
    }))
}

struct FakeState {
    health_queue: VecDeque<StatusCode>,
    health_default: StatusCode,
    health_hits: usize,
    separate_reply: Reply,
    separate_requests: Vec<Value>,
    // 每个任务的脚本，只剩最后一条时重复返回
    status_scripts: HashMap<String, VecDeque<Reply>>,
    status_hits: HashMap<String, usize>,
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeBackend {
    pub base_url: String,
    state: Shared,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState {
            health_queue: VecDeque::new(),
            health_default: StatusCode::OK,
            health_hits: 0,
            separate_reply: Reply::ok(json!({"success": true, "task_id": "abc", "message": "Separation started"})),
            separate_requests: Vec::new(),
            status_scripts: HashMap::new(),
            status_hits: HashMap::new(),
        }));

        let app = Router::new()
            .route("/health", get(health))
            .route("/separate", post(separate))
            .route("/analyze", post(analyze))
            .route("/status/{task_id}", get(status))
            .route("/list-models", get(list_models))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn set_health(&self, code: StatusCode) {
        self.state.lock().unwrap().health_default = code;
    }

    pub fn queue_health(&self, codes: &[StatusCode]) {
        self.state.lock().unwrap().health_queue.extend(codes.iter().copied());
    }

    pub fn health_hits(&self) -> usize {
        self.state.lock().unwrap().health_hits
    }

    pub fn reply_separate(&self, reply: Reply) {
        self.state.lock().unwrap().separate_reply = reply;
    }

    pub fn separate_requests(&self) -> Vec<Value> {
        self.state.lock().unwrap().separate_requests.clone()
    }

    pub fn script_status(&self, task_id: &str, replies: Vec<Reply>) {
        self.state
            .lock()
            .unwrap()
            .status_scripts
            .insert(task_id.to_string(), replies.into());
    }

    pub fn status_hits(&self, task_id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .status_hits
            .get(task_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_status_hits(&self) -> usize {
        self.state.lock().unwrap().status_hits.values().sum()
    }
}

async fn health(State(state): State<Shared>) -> Response {
    let mut state = state.lock().unwrap();
    state.health_hits += 1;
    let code = state.health_queue.pop_front().unwrap_or(state.health_default);
    (code, Json(json!({"status": "healthy", "timestamp": "2026-10-17T00:00:00"}))).into_response()
}

async fn separate(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.separate_requests.push(body);
    state.separate_reply.clone().into_response()
}

async fn analyze(Json(body): Json<Value>) -> Response {
    Reply::ok(json!({
        "success": true,
        "audio_info": {
            "file_path": body["input_path"],
            "file_size": 5242880,
            "file_extension": ".mp3",
            "duration": 180.0,
            "samplerate": 44100,
            "channels": 2,
            "format": "MP3",
            "tempo": 120.0
        },
        "estimated_processing_time": 1440.0
    }))
    .into_response()
}

async fn status(State(state): State<Shared>, UrlPath(task_id): UrlPath<String>) -> Response {
    let mut state = state.lock().unwrap();
    *state.status_hits.entry(task_id.clone()).or_insert(0) += 1;

    let Some(script) = state.status_scripts.get_mut(&task_id) else {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Task not found"}))).into_response();
    };
    let reply = if script.len() > 1 {
        script.pop_front()
    } else {
        script.front().cloned()
    };

    match reply {
        Some(reply) => reply.into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Task not found"}))).into_response(),
    }
}

async fn list_models() -> Response {
    Reply::ok(json!({
        "models": [
            {"name": "2stems", "description": "Vocals + Accompaniment"},
            {"name": "4stems", "description": "Vocals + Drums + Bass + Other"},
            {"name": "5stems", "description": "Vocals + Drums + Bass + Piano + Other"}
        ]
    }))
    .into_response()
}

/// 一个没有任何服务监听的地址
pub async fn dead_backend_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// -----------------------------------------------------------------------------------------------
// 假的平台桥

#[derive(Debug, Default)]
pub struct MockBridge {
    pub running: AtomicBool,
    pub start_fails: AtomicBool,
    pub check_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
}

impl MockBridge {
    pub fn running() -> Arc<Self> {
        let bridge = Self::default();
        bridge.running.store(true, Ordering::SeqCst);
        Arc::new(bridge)
    }

    pub fn stopped() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn checks(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendBridge for MockBridge {
    async fn check_backend_status(&self) -> Result<String, BridgeError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        if self.running.load(Ordering::SeqCst) {
            Ok("Python backend is running".to_string())
        } else {
            Err(BridgeError::NotRunning)
        }
    }

    async fn start_backend(&self) -> Result<String, BridgeError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.start_fails.load(Ordering::SeqCst) {
            return Err(BridgeError::ScriptNotFound("py-backend/main.py".to_string()));
        }
        self.running.store(true, Ordering::SeqCst);
        Ok("Python backend started successfully (PID: 4242)".to_string())
    }

    async fn get_file_metadata(&self, _path: &Path) -> Result<FileMetadata, BridgeError> {
        Ok(FileMetadata { size: 5_242_880 })
    }
}

// -----------------------------------------------------------------------------------------------

pub fn test_config(base_url: &str) -> StudioConfig {
    StudioConfig {
        backend_url: base_url.to_string(),
        request_timeout: Duration::from_secs(2),
        health_attempts: 3,
        health_delay: Duration::from_millis(10),
        poll_interval: Duration::from_millis(25),
        ..StudioConfig::default()
    }
}

/// 轮询等待条件成立
pub async fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
