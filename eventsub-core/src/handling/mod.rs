//! 失败处理（handling）
//!
//! - `HandlingOutcome`：分类后执行的处理结果；
//! - `HandlingPolicy`：订阅者自带的「分类 → 结果」映射，`HandleByHost` 表示沿用分类默认值；
//! - `classify`：将订阅者错误映射为 `Classification`；
//! - `OutcomeExecutor`：执行处理结果的副作用（日志、工作状态、埋点、终止进程）。
//!
mod classifier;
mod executor;
mod policy;

pub use classifier::{Classification, classify};
pub use executor::{FailFast, OutcomeExecutor, ProcessFailFast};
pub use policy::{CategoryDefaults, HandlingPolicy};

use serde::{Deserialize, Serialize};
use std::fmt;

/// 处理结果
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlingOutcome {
    /// 交由宿主决定：原样抛出
    HandleByHost,
    /// 交由订阅者决定：标记为可重试并抛出
    HandleBySubscriber,
    Retry,
    CompleteSilent,
    CompleteInfo,
    CompleteWarning,
    CompleteError,
    /// 记录致命日志并请求终止进程
    CriticalFailFast,
}

impl HandlingOutcome {
    pub const ALL: [HandlingOutcome; 8] = [
        Self::HandleByHost,
        Self::HandleBySubscriber,
        Self::Retry,
        Self::CompleteSilent,
        Self::CompleteInfo,
        Self::CompleteWarning,
        Self::CompleteError,
        Self::CriticalFailFast,
    ];

    /// 执行后的 `is_transient`；`None` 表示保持不变
    pub const fn transient(self) -> Option<bool> {
        match self {
            Self::HandleByHost => None,
            Self::HandleBySubscriber | Self::Retry => Some(true),
            Self::CompleteSilent
            | Self::CompleteInfo
            | Self::CompleteWarning
            | Self::CompleteError
            | Self::CriticalFailFast => Some(false),
        }
    }

    /// 是否吞掉失败（视为已处理完毕）
    pub const fn is_complete(self) -> bool {
        matches!(
            self,
            Self::CompleteSilent | Self::CompleteInfo | Self::CompleteWarning | Self::CompleteError
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HandleByHost => "handle_by_host",
            Self::HandleBySubscriber => "handle_by_subscriber",
            Self::Retry => "retry",
            Self::CompleteSilent => "complete_silent",
            Self::CompleteInfo => "complete_info",
            Self::CompleteWarning => "complete_warning",
            Self::CompleteError => "complete_error",
            Self::CriticalFailFast => "critical_fail_fast",
        }
    }
}

impl fmt::Display for HandlingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
