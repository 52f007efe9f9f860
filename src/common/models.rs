use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// -----------------------------------------------------------------------------------------------

/// 用户选择的音频文件，选中后不再修改，重新选择时整体替换
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub duration: Option<f64>, // 秒
}

impl AudioFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        Self {
            name,
            path,
            size,
            duration: None,
        }
    }

    pub fn from_metadata(path: impl AsRef<Path>, metadata: &FileMetadata) -> Self {
        Self::new(path.as_ref(), metadata.size)
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    // 例如 "5.00 MB"
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size as f64 / 1024.0 / 1024.0)
    }

    // 例如 "3:05"
    pub fn duration_label(&self) -> Option<String> {
        self.duration.map(|d| {
            let total = d.max(0.0).floor() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        })
    }
}

/// 平台桥返回的文件元数据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub size: u64,
}

// -----------------------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
#[error("不支持的音轨数量: {0}，只能是 2、4 或 5")]
pub struct InvalidStemCount(pub u8);

/// 分离配置：2、4 或 5 个音轨
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StemCount {
    #[default]
    Two = 2,
    Four = 4,
    Five = 5,
}

impl StemCount {
    pub fn count(self) -> u8 {
        self as u8
    }

    /// 后端使用的模型名
    pub fn model_name(self) -> &'static str {
        match self {
            StemCount::Two => "2stems",
            StemCount::Four => "4stems",
            StemCount::Five => "5stems",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StemCount::Two => "Vocals + Accompaniment",
            StemCount::Four => "Vocals + Drums + Bass + Other",
            StemCount::Five => "Vocals + Drums + Bass + Piano + Other",
        }
    }
}

impl TryFrom<u8> for StemCount {
    type Error = InvalidStemCount;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(StemCount::Two),
            4 => Ok(StemCount::Four),
            5 => Ok(StemCount::Five),
            other => Err(InvalidStemCount(other)),
        }
    }
}

impl fmt::Display for StemCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stems", self.count())
    }
}

// -----------------------------------------------------------------------------------------------

/// 后端连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl BackendStatus {
    pub fn label(self) -> &'static str {
        match self {
            BackendStatus::Disconnected => "Backend Disconnected",
            BackendStatus::Connecting => "Connecting...",
            BackendStatus::Connected => "Backend Connected",
        }
    }
}
