use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("无效的后端地址: {0}")]
    InvalidUrl(String),

    #[error("响应解析失败: {0}")]
    InvalidResponse(String),

    #[error("后端返回异常状态码: {0}")]
    UnexpectedStatus(u16),

    // 消息原样展示给用户
    #[error("{0}")]
    Rejected(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}
