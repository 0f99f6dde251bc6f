//! 分发器（Dispatcher）
//!
//! 单个事件的处理流程：
//! `Received → Matching → {Unmatched | Ambiguous | Invoking} → {Completed | Failed}`。
//!
//! - 未匹配 / 歧义：直接按配置的处理结果执行，不经过分类；
//! - 调用订阅者成功：标记完成并记录成功埋点；
//! - 订阅者返回已分类失败：原样抛出；取消：不分类直接冒泡；
//! - 其余失败：按订阅者策略分类后交给执行器。
//!
use crate::config::DispatcherConfig;
use crate::envelope::EventEnvelope;
use crate::error::{DispatchError, ErrorCode, ReceiveError, SubscriberError, SubscriberException};
use crate::handling::{HandlingOutcome, OutcomeExecutor, classify};
use crate::registry::{DispatchOutcome, SubscriberDescriptor, SubscriptionRegistry};
use crate::subscriber::Args;
use bon::Builder;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span};

/// 事件分发器
#[derive(Builder, Clone)]
pub struct Dispatcher {
    registry: Arc<SubscriptionRegistry>,
    #[builder(default)]
    config: DispatcherConfig,
    #[builder(default)]
    executor: OutcomeExecutor,
}

impl Dispatcher {
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// 配置只能在分发器被共享（开始分发）之前修改
    pub fn config_mut(&mut self) -> &mut DispatcherConfig {
        &mut self.config
    }

    pub fn set_not_subscribed_policy(&mut self, outcome: HandlingOutcome) {
        self.config.not_subscribed = outcome;
    }

    pub fn set_ambiguous_subscriber_policy(&mut self, outcome: HandlingOutcome) {
        self.config.ambiguous_subscriber = outcome;
    }

    /// 分发单个事件
    ///
    /// 返回 `Ok(())` 表示事件已处理完毕（包括失败被吞掉的情形）；
    /// 返回 `Err` 时由调用方（传输适配层）决定重投或退避。
    pub async fn dispatch(
        &self,
        event: &EventEnvelope,
        args: &mut Args,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError> {
        let span = debug_span!("dispatch", event_id = %event.id());
        async move {
            match self.registry.find_match(event) {
                DispatchOutcome::NoMatch => {
                    debug!("no subscriber matched");
                    let exception = SubscriberException::not_subscribed(event.id());
                    self.executor
                        .execute(self.config.not_subscribed, exception)
                        .await?;
                    Ok(())
                }
                DispatchOutcome::AmbiguousMatch { first, second } => {
                    debug!(first = first.name(), second = second.name(), "ambiguous subscribers");
                    let exception =
                        SubscriberException::ambiguous(event.id(), first.name(), second.name());
                    self.executor
                        .execute(self.config.ambiguous_subscriber, exception)
                        .await?;
                    Ok(())
                }
                DispatchOutcome::Matched(descriptor) => {
                    self.invoke(descriptor, event, args, cancel).await
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn invoke(
        &self,
        descriptor: &SubscriberDescriptor,
        event: &EventEnvelope,
        args: &mut Args,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError> {
        let subscriber = descriptor.subscriber();
        debug!(subscriber = subscriber.name(), "invoking subscriber");

        // 订阅者 panic 视为未知错误，同样经过分类
        let call = AssertUnwindSafe(subscriber.receive(event, args, cancel)).catch_unwind();
        let received = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(event)),
            received = call => received.unwrap_or_else(|panic| Err(panicked(panic).into())),
        };

        match received {
            Ok(()) => {
                self.executor.succeed(event.id()).await;
                debug!(subscriber = subscriber.name(), "event completed");
                Ok(())
            }
            Err(ReceiveError::Classified(exception)) => {
                debug!(
                    subscriber = subscriber.name(),
                    source = %exception.source(),
                    "subscriber raised an already classified failure"
                );
                Err(exception.into())
            }
            Err(ReceiveError::Failed(error)) if error.code() == ErrorCode::Cancelled => {
                Err(cancelled(event))
            }
            Err(ReceiveError::Failed(error)) => {
                let classification = classify(&subscriber.handling_policy(), &error);
                debug!(
                    subscriber = subscriber.name(),
                    category = %classification.category,
                    outcome = %classification.outcome,
                    "subscriber failure classified"
                );
                let exception = SubscriberException::from_error(error, event.id(), subscriber.name());
                self.executor
                    .execute(classification.outcome, exception)
                    .await?;
                Ok(())
            }
        }
    }
}

fn panicked(payload: Box<dyn Any + Send>) -> SubscriberError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    SubscriberError::new(ErrorCode::Unknown, format!("subscriber panicked: {detail}"))
}

fn cancelled(event: &EventEnvelope) -> DispatchError {
    DispatchError::Cancelled {
        event_id: event.id().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExceptionSource, SubscriberError};
    use crate::handling::{FailFast, HandlingPolicy};
    use crate::matching::MatchCriteria;
    use crate::subscriber::Subscriber;
    use crate::tracking::Instrumentation;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Scripted {
        name: &'static str,
        calls: AtomicUsize,
        fail_with: Option<fn() -> ReceiveError>,
    }

    #[async_trait]
    impl Subscriber for Scripted {
        fn name(&self) -> &str {
            self.name
        }
        async fn receive(
            &self,
            _event: &EventEnvelope,
            args: &mut Args,
            _cancel: &CancellationToken,
        ) -> Result<(), ReceiveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            args.insert("handled_by".into(), self.name.into());
            match self.fail_with {
                Some(f) => Err(f()),
                None => Ok(()),
            }
        }
    }

    struct Sleepy;

    #[async_trait]
    impl Subscriber for Sleepy {
        fn name(&self) -> &str {
            "sleepy"
        }
        async fn receive(
            &self,
            _event: &EventEnvelope,
            _args: &mut Args,
            _cancel: &CancellationToken,
        ) -> Result<(), ReceiveError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Sink(Mutex<Vec<(Option<HandlingOutcome>, Option<ExceptionSource>)>>);
    impl Instrumentation for Sink {
        fn instrument(&self, outcome: Option<HandlingOutcome>, error: Option<&SubscriberException>) {
            self.0
                .lock()
                .unwrap()
                .push((outcome, error.map(|e| e.source())));
        }
    }

    #[derive(Default)]
    struct Hook(AtomicUsize);
    impl FailFast for Hook {
        fn fail_fast(&self, _message: &str, _error: &SubscriberException) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn scripted(name: &'static str, fail_with: Option<fn() -> ReceiveError>) -> Arc<Scripted> {
        Arc::new(Scripted {
            name,
            calls: AtomicUsize::new(0),
            fail_with,
        })
    }

    fn on_subject(subscriber: Arc<dyn Subscriber>, subject: &str) -> SubscriberDescriptor {
        SubscriberDescriptor::new(
            subscriber,
            vec![MatchCriteria::builder().subject(subject).build()],
        )
    }

    fn dispatcher(descriptors: Vec<SubscriberDescriptor>, sink: Arc<Sink>, hook: Arc<Hook>) -> Dispatcher {
        let registry: SubscriptionRegistry = descriptors.into_iter().collect();
        Dispatcher::builder()
            .registry(Arc::new(registry))
            .executor(
                OutcomeExecutor::builder()
                    .instrumentation(sink)
                    .fail_fast(hook)
                    .build(),
            )
            .build()
    }

    fn event(subject: &str) -> EventEnvelope {
        EventEnvelope::builder().id("evt").subject(subject).build()
    }

    #[tokio::test]
    async fn matched_subscriber_is_invoked_once() {
        let orders = scripted("orders", None);
        let sink = Arc::new(Sink::default());
        let d = dispatcher(
            vec![on_subject(orders.clone(), "orders/*")],
            sink.clone(),
            Arc::default(),
        );
        let mut args = Args::new();
        d.dispatch(&event("orders/created"), &mut args, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(orders.calls.load(Ordering::SeqCst), 1);
        assert_eq!(args["handled_by"], "orders");
        assert_eq!(*sink.0.lock().unwrap(), vec![(None, None)]);
    }

    #[tokio::test]
    async fn no_match_runs_not_subscribed_policy_once() {
        let sink = Arc::new(Sink::default());
        let d = dispatcher(vec![], sink.clone(), Arc::default());
        let err = d
            .dispatch(&event("orders/created"), &mut Args::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        let exc = err.exception().unwrap();
        assert_eq!(exc.source(), ExceptionSource::NotSubscribed);
        assert!(exc.is_transient());
        assert_eq!(
            *sink.0.lock().unwrap(),
            vec![(
                Some(HandlingOutcome::HandleBySubscriber),
                Some(ExceptionSource::NotSubscribed)
            )]
        );
    }

    #[tokio::test]
    async fn configured_not_subscribed_policy_can_swallow() {
        let mut d = dispatcher(vec![], Arc::default(), Arc::default());
        d.set_not_subscribed_policy(HandlingOutcome::CompleteSilent);
        d.dispatch(&event("nobody/cares"), &mut Args::new(), &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn ambiguous_match_invokes_nobody_and_fails_fast() {
        let a = scripted("a", None);
        let b = scripted("b", None);
        let hook = Arc::new(Hook::default());
        let d = dispatcher(
            vec![on_subject(a.clone(), "orders/*"), on_subject(b.clone(), "orders/**")],
            Arc::default(),
            hook.clone(),
        );
        let err = d
            .dispatch(&event("orders/created"), &mut Args::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.exception().unwrap().source(), ExceptionSource::Ambiguous);
        assert_eq!(hook.0.load(Ordering::SeqCst), 1);
        assert_eq!(a.calls.load(Ordering::SeqCst), 0);
        assert_eq!(b.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn preclassified_failure_skips_classification() {
        let failing = scripted(
            "failing",
            Some(|| {
                SubscriberException::new(
                    ExceptionSource::Deserialization,
                    "evt",
                    ErrorCode::Validation,
                    "bad payload",
                )
                .into()
            }),
        );
        let sink = Arc::new(Sink::default());
        let d = dispatcher(vec![on_subject(failing, "orders/*")], sink.clone(), Arc::default());
        let err = d
            .dispatch(&event("orders/created"), &mut Args::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        let exc = err.exception().unwrap();
        assert_eq!(exc.source(), ExceptionSource::Deserialization);
        assert!(!exc.is_resolved());
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_code_bubbles_unclassified() {
        let failing = scripted("failing", Some(|| SubscriberError::cancelled().into()));
        let sink = Arc::new(Sink::default());
        let d = dispatcher(vec![on_subject(failing, "orders/*")], sink.clone(), Arc::default());
        let err = d
            .dispatch(&event("orders/created"), &mut Args::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled { .. }));
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancellation_token_interrupts_subscriber() {
        let sink = Arc::new(Sink::default());
        let d = dispatcher(vec![on_subject(Arc::new(Sleepy), "orders/*")], sink.clone(), Arc::default());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let err = tokio::time::timeout(
            Duration::from_secs(5),
            d.dispatch(&event("orders/created"), &mut Args::new(), &cancel),
        )
        .await
        .expect("dispatch should observe cancellation")
        .unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled { ref event_id } if event_id == "evt"));
        assert!(sink.0.lock().unwrap().is_empty());
    }

    struct Panicky;

    #[async_trait]
    impl Subscriber for Panicky {
        fn name(&self) -> &str {
            "panicky"
        }
        fn handling_policy(&self) -> HandlingPolicy {
            HandlingPolicy::default()
                .on(crate::error::ErrorCategory::Unhandled, HandlingOutcome::CompleteError)
        }
        async fn receive(
            &self,
            event: &EventEnvelope,
            _args: &mut Args,
            _cancel: &CancellationToken,
        ) -> Result<(), ReceiveError> {
            panic!("cannot project {}", event.id());
        }
    }

    #[tokio::test]
    async fn panicking_subscriber_is_classified_as_unhandled() {
        let sink = Arc::new(Sink::default());
        let d = dispatcher(
            vec![on_subject(Arc::new(Panicky), "orders/*")],
            sink.clone(),
            Arc::default(),
        );
        d.dispatch(&event("orders/created"), &mut Args::new(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            *sink.0.lock().unwrap(),
            vec![(Some(HandlingOutcome::CompleteError), Some(ExceptionSource::Subscriber))]
        );
    }

    #[test]
    fn panic_payload_becomes_unknown_error() {
        let err = panicked(Box::new(String::from("boom")));
        assert_eq!(err.code(), ErrorCode::Unknown);
        assert_eq!(err.category(), crate::error::ErrorCategory::Unhandled);
        assert!(err.message().contains("boom"));
        assert!(panicked(Box::new(7_u8)).message().contains("non-string"));
    }

    struct Picky;

    #[async_trait]
    impl Subscriber for Picky {
        fn name(&self) -> &str {
            "picky"
        }
        fn handling_policy(&self) -> HandlingPolicy {
            HandlingPolicy::default()
                .on(crate::error::ErrorCategory::InvalidData, HandlingOutcome::CompleteInfo)
        }
        async fn receive(
            &self,
            _event: &EventEnvelope,
            _args: &mut Args,
            _cancel: &CancellationToken,
        ) -> Result<(), ReceiveError> {
            Err(SubscriberError::validation("rejected").into())
        }
    }

    #[tokio::test]
    async fn subscriber_policy_drives_outcome() {
        let sink = Arc::new(Sink::default());
        let d = dispatcher(vec![on_subject(Arc::new(Picky), "orders/*")], sink.clone(), Arc::default());
        d.dispatch(&event("orders/created"), &mut Args::new(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            *sink.0.lock().unwrap(),
            vec![(Some(HandlingOutcome::CompleteInfo), Some(ExceptionSource::Subscriber))]
        );
    }
}
