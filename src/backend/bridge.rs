use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::error::BridgeError;
use crate::common::models::FileMetadata;

/// 后端进程的旁路生命周期命令，不走 HTTP
#[async_trait]
pub trait BackendBridge: Send + Sync {
    /// 后端进程在运行时返回 Ok，否则返回错误
    async fn check_backend_status(&self) -> Result<String, BridgeError>;

    /// 幂等启动，已经在运行时直接返回
    async fn start_backend(&self) -> Result<String, BridgeError>;

    async fn get_file_metadata(&self, path: &Path) -> Result<FileMetadata, BridgeError>;

    fn app_version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

// -----------------------------------------------------------------------------------------------

/// 通过本地进程管理 Python 后端
#[derive(Debug, Clone)]
pub struct ProcessBridge {
    python_cmd: String,
    script_path: PathBuf,
}

impl ProcessBridge {
    pub fn new(python_cmd: impl Into<String>, script_path: impl Into<PathBuf>) -> Self {
        Self {
            python_cmd: python_cmd.into(),
            script_path: script_path.into(),
        }
    }

    // pgrep -f 的匹配模式，例如 "python3.*main.py"
    fn process_pattern(&self) -> String {
        let script_name = self
            .script_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.script_path.to_string_lossy().into_owned());
        format!("{}.*{}", self.python_cmd, script_name)
    }

    // 脚本位于 <项目根目录>/py-backend/main.py
    fn project_root(&self) -> PathBuf {
        self.script_path
            .parent()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    // 子进程的工作目录是项目根目录，相对路径要先按当前目录解析
    fn resolved_script(&self) -> Result<PathBuf, BridgeError> {
        Ok(std::path::absolute(&self.script_path)?)
    }
}

#[async_trait]
impl BackendBridge for ProcessBridge {
    async fn check_backend_status(&self) -> Result<String, BridgeError> {
        let output = Command::new("pgrep")
            .arg("-f")
            .arg(self.process_pattern())
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await?;

        if output.stdout.is_empty() {
            debug!("未找到后端进程: {}", self.process_pattern());
            return Err(BridgeError::NotRunning);
        }

        Ok("Python backend is running".to_string())
    }

    async fn start_backend(&self) -> Result<String, BridgeError> {
        if self.check_backend_status().await.is_ok() {
            return Ok("Python backend is already running".to_string());
        }

        let script = self.resolved_script()?;
        if !script.exists() {
            warn!("后端脚本不存在: {:?}", script);
            return Err(BridgeError::ScriptNotFound(
                script.to_string_lossy().into_owned(),
            ));
        }

        info!("启动 Python 后端: {:?}", script);
        let child = Command::new(&self.python_cmd)
            .arg(&script)
            .current_dir(self.project_root())
            .stdin(Stdio::null())
            .spawn()?;

        let pid = child.id().unwrap_or_default();
        info!("Python 后端已启动, PID: {}", pid);
        Ok(format!("Python backend started successfully (PID: {})", pid))
    }

    async fn get_file_metadata(&self, path: &Path) -> Result<FileMetadata, BridgeError> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(FileMetadata {
            size: metadata.len(),
        })
    }
}
