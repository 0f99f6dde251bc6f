//! 事件来源（EventSource）协议
//!
//! 返回 `'static` 生命周期的事件流，便于在 `tokio::spawn` 中消费。
//!
use crate::error::HostResult;
use async_trait::async_trait;
use eventsub_core::EventEnvelope;
use futures_core::stream::BoxStream;

/// 事件来源：向宿主提供入站事件流
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn subscribe(&self) -> BoxStream<'static, HostResult<EventEnvelope>>;
}
