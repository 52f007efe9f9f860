use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("后端进程未运行")]
    NotRunning,

    #[error("找不到后端脚本: {0}")]
    ScriptNotFound(String),

    #[error("IO操作失败: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("后端健康检查超时 (已尝试 {attempts} 次)")]
    Timeout { attempts: u32 },

    #[error("后端启动失败: {0}")]
    Bridge(#[from] BridgeError),
}
