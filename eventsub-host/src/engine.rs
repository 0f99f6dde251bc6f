//! 订阅宿主（SubscriptionHost）
//!
//! 长驻任务：订阅事件来源的事件流，以有界并发调用分发器。
//! - 每个事件使用独立的 `Args`；
//! - 分发返回的失败只记录日志，是否重投由具体来源决定；
//! - 关闭时停止拉取新事件，正在处理的事件会观察到取消信号；
//! - 提供关闭与等待的 `HostHandle`。
//!
use crate::config::HostConfig;
use crate::source::EventSource;
use bon::Builder;
use eventsub_core::{Args, DispatchError, Dispatcher, EventEnvelope};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Builder)]
pub struct SubscriptionHost {
    source: Arc<dyn EventSource>,
    dispatcher: Arc<Dispatcher>,
    #[builder(default)]
    config: HostConfig,
}

impl SubscriptionHost {
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// 启动宿主，返回可用于关闭/等待的句柄
    pub fn start(self: Arc<Self>) -> HostHandle {
        let token = CancellationToken::new();
        let task = tokio::spawn(Self::subscribe_loop(self, token.clone()));

        HostHandle {
            token,
            tasks: vec![task],
        }
    }

    async fn subscribe_loop(self: Arc<Self>, token: CancellationToken) {
        let stream = self
            .source
            .subscribe()
            .await
            .take_until(token.clone().cancelled_owned());
        let concurrency = self.config.concurrency;
        info!(concurrency, "subscription host started");

        stream
            .for_each_concurrent(Some(concurrency), |item| {
                let host = self.clone();
                let token = token.clone();
                async move {
                    match item {
                        Ok(event) => host.handle(event, &token).await,
                        Err(err) => warn!(error = %err, "event source error, skipping"),
                    }
                }
            })
            .await;

        info!("subscription host stopped");
    }

    async fn handle(&self, event: EventEnvelope, token: &CancellationToken) {
        let mut args = Args::new();
        match self.dispatcher.dispatch(&event, &mut args, token).await {
            Ok(()) => debug!(event_id = %event.id(), "event handled"),
            Err(DispatchError::Cancelled { event_id }) => {
                debug!(%event_id, "dispatch cancelled");
            }
            Err(DispatchError::Subscriber(exc)) => {
                warn!(
                    event_id = %exc.event_id(),
                    subscriber = exc.subscriber().unwrap_or("-"),
                    source = ?exc.source(),
                    code = ?exc.error_code(),
                    transient = exc.is_transient(),
                    error = %exc,
                    "event not completed"
                );
            }
        }
    }
}

/// 宿主运行句柄：用于优雅关闭与等待任务结束
pub struct HostHandle {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl HostHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn join(mut self) {
        let tasks = std::mem::take(&mut self.tasks);

        for t in tasks {
            if let Err(err) = t.await {
                error!(error = %err, "subscription host task ended abnormally");
            }
        }
    }
}

impl Drop for HostHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_inmemory::InMemoryEventSource;
    use async_trait::async_trait;
    use eventsub_core::{
        MatchCriteria, ReceiveError, Subscriber, SubscriberDescriptor, SubscriptionRegistry,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counting {
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Subscriber for Counting {
        fn name(&self) -> &str {
            "counting"
        }
        async fn receive(
            &self,
            _event: &EventEnvelope,
            _args: &mut Args,
            _cancel: &CancellationToken,
        ) -> Result<(), ReceiveError> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn host_dispatches_published_events_until_shutdown() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut registry = SubscriptionRegistry::new();
        registry.register(SubscriberDescriptor::new(
            Arc::new(Counting { seen: seen.clone() }),
            vec![MatchCriteria::builder().subject("orders/*").build()],
        ));
        let dispatcher = Dispatcher::builder().registry(Arc::new(registry)).build();
        let source = InMemoryEventSource::new(16);

        let host = Arc::new(
            SubscriptionHost::builder()
                .source(Arc::new(source.clone()))
                .dispatcher(Arc::new(dispatcher))
                .build(),
        );
        let handle = host.start();
        wait_until(|| source.subscriber_count() == 1).await;

        for i in 0..3 {
            source
                .publish(
                    EventEnvelope::builder()
                        .id(format!("e-{i}"))
                        .subject("orders/created")
                        .build(),
                )
                .unwrap();
        }
        wait_until(|| seen.load(Ordering::SeqCst) == 3).await;

        handle.shutdown();
        assert!(handle.is_shutdown());
        handle.join().await;
        assert_eq!(source.subscriber_count(), 0);
    }
}
