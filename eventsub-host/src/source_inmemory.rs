//! 内存版事件来源（InMemoryEventSource）
//!
//! 基于 `tokio::sync::broadcast`：
//! - `publish`：克隆并广播事件，无订阅者时事件被丢弃；
//! - `subscribe`：返回 `'static` 事件流，落后过多时产生 `HostError::Source`；
//! - 典型用途：测试、示例与本地开发。
//!
use crate::error::{HostError, HostResult};
use crate::source::EventSource;
use async_trait::async_trait;
use eventsub_core::EventEnvelope;
use futures_core::stream::BoxStream;
use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

#[derive(Clone)]
pub struct InMemoryEventSource {
    tx: broadcast::Sender<EventEnvelope>,
}

impl InMemoryEventSource {
    /// `capacity` 为广播缓冲区容量，最小为 1
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// 宿主尚未订阅时发布的事件直接丢失，不会缓存到之后的订阅者
    pub fn publish(&self, event: EventEnvelope) -> HostResult<()> {
        if self.tx.send(event).is_err() {
            debug!("no active subscription, event dropped");
        }
        Ok(())
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl EventSource for InMemoryEventSource {
    async fn subscribe(&self) -> BoxStream<'static, HostResult<EventEnvelope>> {
        let rx = self.tx.subscribe();
        let stream =
            BroadcastStream::new(rx).map(|r| r.map_err(|e| HostError::source_error(e.to_string())));
        Box::pin(stream)
    }
}
