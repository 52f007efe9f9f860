use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::common::models::{AudioFile, StemCount};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl TaskStatus {
    /// completed 和 error 之后不再有状态转换
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Processing => "Processing",
            TaskStatus::Completed => "Completed",
            TaskStatus::Error => "Error",
        }
    }
}

/// 一次分离任务，从提交一直跟踪到终态
#[derive(Debug, Clone, PartialEq)]
pub struct SeparationTask {
    pub id: String,
    pub status: TaskStatus,
    pub progress: f64, // 0.0 ~ 1.0
    pub input_file: AudioFile,
    pub output_dir: PathBuf,
    pub stems: StemCount,
    pub output_files: Option<Vec<String>>,
    pub current_step: Option<String>,
    pub eta_seconds: Option<u64>,
    pub error_message: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl SeparationTask {
    /// 提交前在本地创建的任务，使用临时ID
    pub fn provisional(
        id: impl Into<String>,
        input_file: AudioFile,
        output_dir: impl AsRef<Path>,
        stems: StemCount,
        current_step: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::Processing,
            progress: 0.0,
            input_file,
            output_dir: output_dir.as_ref().to_path_buf(),
            stems,
            output_files: None,
            current_step: Some(current_step.into()),
            eta_seconds: None,
            error_message: None,
            start_time: Some(Utc::now()),
            end_time: None,
        }
    }

    pub fn percent(&self) -> u8 {
        (self.progress.clamp(0.0, 1.0) * 100.0).round() as u8
    }

    pub fn output_file_names(&self) -> Vec<String> {
        self.output_files
            .iter()
            .flatten()
            .map(|file| {
                Path::new(file)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.clone())
            })
            .collect()
    }

    pub fn elapsed(&self) -> Option<chrono::Duration> {
        let start = self.start_time?;
        Some(self.end_time.unwrap_or_else(Utc::now) - start)
    }
}

/// 任务的局部更新，None 表示该字段本次未提供
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub task_id: Option<String>,
    pub status: Option<TaskStatus>,
    pub progress: Option<f64>,
    pub current_step: Option<String>,
    pub eta_seconds: Option<u64>,
    pub error_message: Option<String>,
    pub output_files: Option<Vec<String>>,
}

impl TaskUpdate {
    /// 后端分配了正式任务ID
    pub fn adopt_id(task_id: impl Into<String>, current_step: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            status: Some(TaskStatus::Processing),
            current_step: Some(current_step.into()),
            ..Default::default()
        }
    }

    pub fn failed(current_step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Error),
            current_step: Some(current_step.into()),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_some_and(TaskStatus::is_terminal)
    }
}
