//! 宿主层错误定义
//!
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HostError {
    #[error("config error: {source}")]
    Config {
        #[from]
        source: serde_json::Error,
    },
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },
    #[error("event source error: {reason}")]
    Source { reason: String },
}

impl HostError {
    pub fn source_error(reason: impl Into<String>) -> Self {
        Self::Source {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type HostResult<T> = Result<T, HostError>;
