use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::models::TaskUpdate;
use super::store::TaskStore;
use crate::common::api::client::BackendClient;
use crate::common::api::models::StatusFetch;

/// 单次轮询的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    NotRegistered,  // 404，后端还没登记这个任务
    TransientError, // 本次失败，继续轮询
    Applied,
    Terminal,
}

/// 按固定间隔查询任务状态，直到任务进入终态
#[derive(Debug, Clone)]
pub struct StatusPoller {
    client: BackendClient,
    store: TaskStore,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(client: BackendClient, store: TaskStore, interval: Duration) -> Self {
        Self {
            client,
            store,
            interval,
        }
    }

    /// 立即查询一次，之后每隔 interval 查询。返回的句柄被丢弃时轮询也会停止
    pub fn start(&self, task_id: impl Into<String>) -> PollingHandle {
        let task_id = task_id.into();
        let token = CancellationToken::new();

        info!("开始轮询任务状态: {}", task_id);
        let poller = self.clone();
        let loop_token = token.clone();
        let loop_task_id = task_id.clone();
        let join = tokio::spawn(async move {
            poller.run(loop_task_id, loop_token).await;
        });

        PollingHandle {
            task_id,
            token,
            join: Some(join),
        }
    }

    async fn run(self, task_id: String, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        // 一次查询比间隔慢时顺延，不会连发
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            // 取消时正在进行的请求直接丢弃，结果不会写入任务
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                outcome = self.tick(&task_id) => outcome,
            };

            if outcome == TickOutcome::Terminal {
                break;
            }
        }

        debug!("任务 {} 的轮询已结束", task_id);
    }

    /// 查询一次并把结果交给 reducer
    pub async fn tick(&self, task_id: &str) -> TickOutcome {
        let payload = match self.client.fetch_status(task_id).await {
            Ok(StatusFetch::Found(payload)) => payload,
            Ok(StatusFetch::NotRegistered) => {
                debug!("任务 {} 尚未在后端注册", task_id);
                return TickOutcome::NotRegistered;
            }
            Err(e) => {
                warn!("查询任务 {} 状态失败: {}", task_id, e);
                return TickOutcome::TransientError;
            }
        };

        let update = TaskUpdate::from(payload);
        let terminal = update.is_terminal();
        let applied = self.store.apply_for(task_id, &update).is_some();

        if terminal {
            // 过期任务的终态不能解锁当前任务
            let owns_flag = applied || self.store.current().is_none();
            if owns_flag && self.store.finish_processing() {
                info!("任务 {} 已结束: {:?}", task_id, update.status);
            }
            TickOutcome::Terminal
        } else {
            TickOutcome::Applied
        }
    }
}

/// 一个正在运行的轮询。stop 可以重复调用
#[derive(Debug)]
pub struct PollingHandle {
    task_id: String,
    token: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl PollingHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn stop(&self) {
        if !self.token.is_cancelled() {
            debug!("停止轮询任务: {}", self.task_id);
            self.token.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && self.join.as_ref().is_some_and(|j| !j.is_finished())
    }

    /// 停止并等待轮询循环退出
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
