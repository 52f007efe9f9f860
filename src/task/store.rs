use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::models::{SeparationTask, TaskUpdate};
use super::reducer;
use crate::events::{EventBus, StudioEvent};

#[derive(Debug, Default)]
struct StoreState {
    current: Option<SeparationTask>,
    processing: bool,
}

/// 当前任务和"处理中"标记。任务只通过 reducer 修改
#[derive(Debug, Clone)]
pub struct TaskStore {
    state: Arc<Mutex<StoreState>>,
    events: EventBus,
}

impl TaskStore {
    pub fn new(events: EventBus) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            events,
        }
    }

    // 锁中毒时继续使用内部数据
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn current(&self) -> Option<SeparationTask> {
        self.lock().current.clone()
    }

    pub fn is_processing(&self) -> bool {
        self.lock().processing
    }

    /// 新建任务时整体替换
    pub fn replace(&self, task: SeparationTask) {
        self.lock().current = Some(task.clone());
        self.events.publish(StudioEvent::TaskChanged(task));
    }

    pub fn clear(&self) {
        self.lock().current = None;
    }

    /// 通过 reducer 合并更新，没有当前任务时返回 None
    pub fn apply(&self, update: &TaskUpdate) -> Option<SeparationTask> {
        let next = {
            let mut state = self.lock();
            let next = reducer::apply_update(state.current.as_ref(), update)?;
            state.current = Some(next.clone());
            next
        };
        self.events.publish(StudioEvent::TaskChanged(next.clone()));
        Some(next)
    }

    /// 只在当前任务ID匹配时合并，过期的轮询结果直接丢弃
    pub fn apply_for(&self, task_id: &str, update: &TaskUpdate) -> Option<SeparationTask> {
        let next = {
            let mut state = self.lock();
            match state.current.as_ref() {
                Some(current) if current.id == task_id => {}
                Some(current) => {
                    debug!("丢弃过期的任务更新: {} (当前任务: {})", task_id, current.id);
                    return None;
                }
                None => return None,
            }
            let next = reducer::apply_update(state.current.as_ref(), update)?;
            state.current = Some(next.clone());
            next
        };
        self.events.publish(StudioEvent::TaskChanged(next.clone()));
        Some(next)
    }

    pub fn begin_processing(&self) {
        let changed = !std::mem::replace(&mut self.lock().processing, true);
        if changed {
            self.events.publish(StudioEvent::ProcessingChanged(true));
        }
    }

    /// 清除处理中标记，只有第一次调用返回 true
    pub fn finish_processing(&self) -> bool {
        let was_processing = std::mem::replace(&mut self.lock().processing, false);
        if was_processing {
            self.events.publish(StudioEvent::ProcessingChanged(false));
        }
        was_processing
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}
