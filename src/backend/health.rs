use std::time::Duration;

use tracing::{debug, warn};

use super::error::BackendError;
use crate::common::api::client::BackendClient;
pub use crate::common::api::models::ProbeOutcome;

/// 有限次数重试的健康检查
#[derive(Debug, Clone)]
pub struct HealthProber {
    client: BackendClient,
}

impl HealthProber {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub async fn probe_once(&self) -> ProbeOutcome {
        self.client.health().await
    }

    /// 每次尝试失败后等待 delay，用完 max_attempts 次返回 Timeout
    pub async fn probe(&self, max_attempts: u32, delay: Duration) -> Result<(), BackendError> {
        for attempt in 1..=max_attempts {
            match self.probe_once().await {
                ProbeOutcome::Ready => {
                    debug!("后端健康检查通过 (第 {} 次)", attempt);
                    return Ok(());
                }
                ProbeOutcome::NotReady(reason) => {
                    debug!("后端尚未就绪 ({}/{}): {}", attempt, max_attempts, reason);
                }
                ProbeOutcome::Malformed(reason) => {
                    warn!("健康检查响应异常 ({}/{}): {}", attempt, max_attempts, reason);
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(delay).await;
            }
        }

        Err(BackendError::Timeout {
            attempts: max_attempts,
        })
    }
}
