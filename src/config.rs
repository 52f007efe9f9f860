use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8080";

/// 编排核心的运行参数
#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub backend_url: String,
    pub request_timeout: Duration,
    pub health_attempts: u32,
    pub health_delay: Duration,
    pub poll_interval: Duration,
    pub python_cmd: String,
    pub backend_script: PathBuf,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            health_attempts: 10,
            health_delay: Duration::from_millis(500),
            poll_interval: Duration::from_secs(1),
            python_cmd: "python3".to_string(),
            backend_script: PathBuf::from("py-backend").join("main.py"),
        }
    }
}
