use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info};

use crate::backend::bridge::BackendBridge;
use crate::backend::error::{BackendError, BridgeError};
use crate::backend::health::HealthProber;
use crate::backend::{AvailabilityManager, BackendStatus};
use crate::common::api::client::BackendClient;
use crate::common::api::error::ApiError;
use crate::common::api::models::{AnalyzeResponse, ModelInfo, SeparateRequest};
use crate::common::models::{AudioFile, StemCount};
use crate::config::StudioConfig;
use crate::events::{EventBus, StudioEvent};
use crate::task::id::provisional_task_id;
use crate::task::models::{SeparationTask, TaskUpdate};
use crate::task::poller::{PollingHandle, StatusPoller};
use crate::task::store::TaskStore;

const STEP_INITIALIZING: &str = "Initializing separator...";
const STEP_SEPARATING: &str = "Separating audio tracks...";
const STEP_FAILED: &str = "Failed to start separation";
const START_FAILED_MESSAGE: &str = "Separation task failed to start";

#[derive(Debug, Error)]
pub enum StudioError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    // 后端返回 success=false
    #[error("{0}")]
    Submission(String),
}

/// 任务编排入口：保证后端可用、提交任务、轮询状态
pub struct Studio {
    client: BackendClient,
    bridge: Arc<dyn BackendBridge>,
    availability: AvailabilityManager,
    store: TaskStore,
    poller: StatusPoller,
    // 同一时间最多一个轮询
    polling: Mutex<Option<PollingHandle>>,
    events: EventBus,
}

impl Studio {
    pub fn new(config: &StudioConfig, bridge: Arc<dyn BackendBridge>) -> Result<Self, ApiError> {
        let client = BackendClient::new(&config.backend_url, config.request_timeout)?;
        let events = EventBus::new();
        let store = TaskStore::new(events.clone());

        let availability = AvailabilityManager::new(
            HealthProber::new(client.clone()),
            Arc::clone(&bridge),
            events.clone(),
            config.health_attempts,
            config.health_delay,
        );
        let poller = StatusPoller::new(client.clone(), store.clone(), config.poll_interval);

        Ok(Self {
            client,
            bridge,
            availability,
            store,
            poller,
            polling: Mutex::new(None),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StudioEvent> {
        self.events.subscribe()
    }

    pub fn backend_status(&self) -> BackendStatus {
        self.availability.status()
    }

    pub fn current_task(&self) -> Option<SeparationTask> {
        self.store.current()
    }

    pub fn is_processing(&self) -> bool {
        self.store.is_processing()
    }

    /// 已选文件和输出目录，并且没有进行中的任务
    pub fn can_start(&self, file: Option<&AudioFile>, output_dir: Option<&Path>) -> bool {
        file.is_some()
            && output_dir.is_some_and(|dir| !dir.as_os_str().is_empty())
            && !self.is_processing()
    }

    pub fn app_version(&self) -> &'static str {
        self.bridge.app_version()
    }

    pub async fn ensure_available(&self) -> Result<(), BackendError> {
        self.availability.ensure_available().await
    }

    pub async fn select_file(&self, path: impl AsRef<Path>) -> Result<AudioFile, StudioError> {
        let path = path.as_ref();
        let metadata = self.bridge.get_file_metadata(path).await?;
        let file = AudioFile::from_metadata(path, &metadata);
        info!("已选择文件: {} ({})", file.name, file.size_label());
        Ok(file)
    }

    pub async fn analyze(&self, file: &AudioFile) -> Result<AnalyzeResponse, StudioError> {
        self.ensure_available().await?;

        let output_dir = file.path.parent().unwrap_or_else(|| Path::new(""));
        let request = SeparateRequest {
            input_path: file.path.to_string_lossy().into_owned(),
            output_dir: output_dir.to_string_lossy().into_owned(),
            stems: StemCount::default().count(),
        };
        Ok(self.client.analyze(&request).await?)
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, StudioError> {
        self.ensure_available().await?;
        Ok(self.client.list_models().await?)
    }

    // -------------------------------------------------------------------------------------------

    fn polling_slot(&self) -> MutexGuard<'_, Option<PollingHandle>> {
        match self.polling.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// 先停掉旧的轮询再开始新的
    pub fn start_polling(&self, task_id: &str) {
        let mut slot = self.polling_slot();
        if let Some(previous) = slot.take() {
            previous.stop();
        }
        *slot = Some(self.poller.start(task_id));
    }

    /// 可以重复调用，没有轮询时什么也不做
    pub fn stop_polling(&self) {
        if let Some(handle) = self.polling_slot().take() {
            handle.stop();
        }
    }

    pub fn polling_task_id(&self) -> Option<String> {
        self.polling_slot()
            .as_ref()
            .filter(|handle| handle.is_active())
            .map(|handle| handle.task_id().to_string())
    }

    /// 开始一次分离。任何失败都落到任务的 error 状态，不向调用方返回错误
    pub async fn start_separation(
        &self,
        file: &AudioFile,
        output_dir: impl AsRef<Path>,
        stems: StemCount,
    ) -> Option<SeparationTask> {
        let output_dir = output_dir.as_ref();

        self.stop_polling();
        self.store.begin_processing();

        let provisional_id = provisional_task_id();
        self.store.replace(SeparationTask::provisional(
            provisional_id.clone(),
            file.clone(),
            output_dir,
            stems,
            STEP_INITIALIZING,
        ));

        match self.submit(file, output_dir, stems, &provisional_id).await {
            Ok(task_id) => {
                info!("分离任务已提交: {}", task_id);
            }
            Err(e) => {
                error!("分离任务失败: {}", e);
                self.stop_polling();
                self.store.apply(&TaskUpdate::failed(STEP_FAILED, e.to_string()));
                self.store.finish_processing();
            }
        }

        self.store.current()
    }

    async fn submit(
        &self,
        file: &AudioFile,
        output_dir: &Path,
        stems: StemCount,
        provisional_id: &str,
    ) -> Result<String, StudioError> {
        self.ensure_available().await?;

        let request = SeparateRequest {
            input_path: file.path.to_string_lossy().into_owned(),
            output_dir: output_dir.to_string_lossy().into_owned(),
            stems: stems.count(),
        };
        debug!("提交分离请求: {:?}", request);

        let response = self.client.separate(&request).await?;
        if !response.success {
            let message = response
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| START_FAILED_MESSAGE.to_string());
            return Err(StudioError::Submission(message));
        }

        let task_id = response
            .task_id
            .unwrap_or_else(|| provisional_id.to_string());

        self.store
            .apply(&TaskUpdate::adopt_id(task_id.clone(), STEP_SEPARATING));
        self.start_polling(&task_id);

        Ok(task_id)
    }

    /// 等待处理中标记被清除，返回最终的任务
    pub async fn wait_for_completion(&self) -> Option<SeparationTask> {
        let mut rx = self.subscribe();

        loop {
            if !self.store.is_processing() {
                return self.store.current();
            }

            match rx.recv().await {
                Ok(StudioEvent::ProcessingChanged(false)) | Err(RecvError::Closed) => {
                    return self.store.current();
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!("事件订阅落后，跳过 {} 条", skipped);
                }
            }
        }
    }
}
