use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::events::{EventBus, StudioEvent};
pub use crate::common::models::BackendStatus;
use bridge::BackendBridge;
use error::BackendError;
use health::HealthProber;

pub mod bridge;
pub mod error;
pub mod health;

// 后端可用性状态机: Disconnected -> Connecting -> Connected，失败回到 Disconnected
pub struct AvailabilityManager {
    prober: HealthProber,
    bridge: Arc<dyn BackendBridge>,
    status: Mutex<BackendStatus>,
    events: EventBus,
    max_attempts: u32,
    delay: Duration,
    // 串行化并发的 ensure_available 调用
    ensure_lock: tokio::sync::Mutex<()>,
}

impl AvailabilityManager {
    pub fn new(
        prober: HealthProber,
        bridge: Arc<dyn BackendBridge>,
        events: EventBus,
        max_attempts: u32,
        delay: Duration,
    ) -> Self {
        Self {
            prober,
            bridge,
            status: Mutex::new(BackendStatus::Disconnected),
            events,
            max_attempts,
            delay,
            ensure_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn status(&self) -> BackendStatus {
        match self.status.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_status(&self, next: BackendStatus) {
        let changed = {
            let mut status = match self.status.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::replace(&mut *status, next) != next
        };
        if changed {
            info!("后端状态: {}", next.label());
            self.events.publish(StudioEvent::BackendStatusChanged(next));
        }
    }

    /// 确保后端可用，每次提交任务前都可以调用
    pub async fn ensure_available(&self) -> Result<(), BackendError> {
        let _guard = self.ensure_lock.lock().await;

        if self.status() == BackendStatus::Connected {
            // 快速复查一次，失败再走完整的启动流程
            match self.prober.probe(1, Duration::ZERO).await {
                Ok(()) => return Ok(()),
                Err(e) => warn!("后端健康检查失败，尝试重新启动: {}", e),
            }
        }

        self.set_status(BackendStatus::Connecting);

        if let Err(status_err) = self.bridge.check_backend_status().await {
            info!("后端未运行，尝试启动: {}", status_err);
            match self.bridge.start_backend().await {
                Ok(message) => info!("{}", message),
                Err(e) => {
                    error!("启动后端失败: {}", e);
                    self.set_status(BackendStatus::Disconnected);
                    return Err(e.into());
                }
            }
        }

        match self.prober.probe(self.max_attempts, self.delay).await {
            Ok(()) => {
                self.set_status(BackendStatus::Connected);
                Ok(())
            }
            Err(e) => {
                error!("无法连接到后端: {}", e);
                self.set_status(BackendStatus::Disconnected);
                Err(e)
            }
        }
    }
}
