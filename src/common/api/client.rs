use std::time::Duration;

use reqwest::{
    Client, ClientBuilder, Response, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use super::error::ApiError;
use super::models::{
    AnalyzeResponse, ModelInfo, ModelsResponse, ProbeOutcome, SeparateRequest, SeparateResponse,
    StatusFetch,
};

const SUBMIT_FALLBACK_MESSAGE: &str = "Failed to start separation task";
const ANALYZE_FALLBACK_MESSAGE: &str = "Failed to analyze audio file";

// 分离后端的 HTTP 客户端
#[derive(Debug, Clone)]
pub struct BackendClient {
    pub inner: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let inner = ClientBuilder::new()
            .timeout(timeout)
            .default_headers(Self::get_default_headers())
            .build()?;

        Ok(Self { inner, base_url })
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("spleeter-studio/", env!("CARGO_PKG_VERSION"))),
        );
        headers
    }

    // 每个片段单独编码，任务ID里可能带空格等字符
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// 单次存活检查，不返回错误，由调用方决定重试策略
    pub async fn health(&self) -> ProbeOutcome {
        let url = match self.endpoint(&["health"]) {
            Ok(url) => url,
            Err(e) => return ProbeOutcome::Malformed(e.to_string()),
        };

        match self.inner.get(url).send().await {
            Ok(resp) if resp.status().is_success() => ProbeOutcome::Ready,
            Ok(resp) if resp.status().is_server_error() => {
                ProbeOutcome::NotReady(format!("状态码 {}", resp.status()))
            }
            Ok(resp) => ProbeOutcome::Malformed(format!("状态码 {}", resp.status())),
            Err(e) => ProbeOutcome::NotReady(e.to_string()),
        }
    }

    /// 提交分离任务，非 2xx 时响应体作为错误信息
    pub async fn separate(&self, request: &SeparateRequest) -> Result<SeparateResponse, ApiError> {
        let url = self.endpoint(&["separate"])?;
        let resp = self.inner.post(url).json(request).send().await?;
        let resp = Self::reject_unless_success(resp, SUBMIT_FALLBACK_MESSAGE).await?;
        Self::handle_response(resp).await
    }

    pub async fn analyze(&self, request: &SeparateRequest) -> Result<AnalyzeResponse, ApiError> {
        let url = self.endpoint(&["analyze"])?;
        let resp = self.inner.post(url).json(request).send().await?;
        let resp = Self::reject_unless_success(resp, ANALYZE_FALLBACK_MESSAGE).await?;
        Self::handle_response(resp).await
    }

    pub async fn fetch_status(&self, task_id: &str) -> Result<StatusFetch, ApiError> {
        let url = self.endpoint(&["status", task_id])?;
        let resp = self.inner.get(url).send().await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(StatusFetch::NotRegistered);
        }
        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus(status.as_u16()));
        }

        Self::handle_response(resp).await.map(StatusFetch::Found)
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        let url = self.endpoint(&["list-models"])?;
        let resp = self.inner.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus(status.as_u16()));
        }

        let models: ModelsResponse = Self::handle_response(resp).await?;
        Ok(models.models)
    }

    async fn reject_unless_success(resp: Response, fallback: &str) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        error!("后端拒绝请求: {} {}", status, body);
        if body.trim().is_empty() {
            Err(ApiError::Rejected(fallback.to_string()))
        } else {
            Err(ApiError::Rejected(body))
        }
    }

    async fn handle_response<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let text = resp.text().await?;
        debug!("响应正文: {}", text);

        serde_json::from_str::<T>(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("解析响应失败: {}. 原始响应: {}", e, text))
        })
    }
}
