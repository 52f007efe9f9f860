use tokio::sync::broadcast;

use crate::backend::BackendStatus;
use crate::task::models::SeparationTask;

const EVENT_CAPACITY: usize = 64;

/// 编排核心对外发布的状态变化，界面层订阅后自行渲染
#[derive(Debug, Clone)]
pub enum StudioEvent {
    TaskChanged(SeparationTask),
    ProcessingChanged(bool),
    BackendStatusChanged(BackendStatus),
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StudioEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    // 没有订阅者时发送失败是正常情况
    pub fn publish(&self, event: StudioEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StudioEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
