use serde::{Deserialize, Serialize};

use crate::task::models::{TaskStatus, TaskUpdate};

// -----------------------------------------------------------------------------------------------
// GET /health

/// 单次存活检查的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ready,
    NotReady(String),  // 连接失败、超时、5xx
    Malformed(String), // 端口上有响应但不像是我们的后端
}

// -----------------------------------------------------------------------------------------------
// POST /separate 与 POST /analyze 共用的请求体

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeparateRequest {
    pub input_path: String,
    pub output_dir: String,
    pub stems: u8,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SeparateResponse {
    pub success: bool,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// -----------------------------------------------------------------------------------------------
// GET /status/{task_id}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WireStatus {
    Processing,
    Completed,
    Error,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StatusPayload {
    pub status: WireStatus,
    pub progress: f64,
    #[serde(default)]
    pub current_step: String,
    #[serde(default)]
    pub eta_seconds: Option<u64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub output_files: Option<Vec<String>>,
}

impl From<WireStatus> for TaskStatus {
    fn from(status: WireStatus) -> Self {
        match status {
            WireStatus::Processing => TaskStatus::Processing,
            WireStatus::Completed => TaskStatus::Completed,
            WireStatus::Error => TaskStatus::Error,
        }
    }
}

// 字段名从后端的 snake_case 转换到本地任务字段
impl From<StatusPayload> for TaskUpdate {
    fn from(payload: StatusPayload) -> Self {
        TaskUpdate {
            task_id: None,
            status: Some(payload.status.into()),
            progress: Some(payload.progress),
            current_step: Some(payload.current_step),
            eta_seconds: payload.eta_seconds,
            error_message: payload.error_message,
            output_files: payload.output_files,
        }
    }
}

/// 一次状态查询的结果，404 表示任务尚未在后端注册
#[derive(Debug, Clone, PartialEq)]
pub enum StatusFetch {
    Found(StatusPayload),
    NotRegistered,
}

// -----------------------------------------------------------------------------------------------
// POST /analyze

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AudioInfo {
    pub file_path: String,
    pub file_size: u64,
    #[serde(default)]
    pub file_extension: String,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub samplerate: Option<u32>,
    #[serde(default)]
    pub channels: Option<u16>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub tempo: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub audio_info: AudioInfo,
    #[serde(default)]
    pub estimated_processing_time: f64,
}

// -----------------------------------------------------------------------------------------------
// GET /list-models

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}
