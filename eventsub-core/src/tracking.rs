//! 外部协作者协议
//!
//! - `WorkTracker`：按事件记录处理状态（完成/失败/未决），通常由持久化存储实现；
//! - `Instrumentation`：记录每次分发的处理结果，`None` 表示成功。
//!
//! 两者都是可选的，缺省即不做任何事；实现需自行保证可被多个分发并发调用。
//!
use crate::error::SubscriberException;
use crate::handling::HandlingOutcome;
use async_trait::async_trait;

/// 工作状态跟踪器
#[async_trait]
pub trait WorkTracker: Send + Sync {
    /// 事件已成功处理
    async fn complete(&self, event_id: &str) -> anyhow::Result<()>;

    /// 事件处理失败且不再重试（消息可被确认移除）
    async fn fail(&self, event_id: &str, message: &str) -> anyhow::Result<()>;

    /// 事件处理结果未决，等待重投
    async fn indeterminate(&self, event_id: &str, message: &str) -> anyhow::Result<()>;
}

/// 埋点接收器
pub trait Instrumentation: Send + Sync {
    fn instrument(&self, outcome: Option<HandlingOutcome>, error: Option<&SubscriberException>);
}
