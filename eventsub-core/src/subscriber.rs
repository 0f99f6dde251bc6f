//! 订阅者（Subscriber）
//!
//! 定义订阅者的统一执行约定：名称、处理策略与 `receive`。需要强类型载荷的订阅者
//! 实现 `TypedSubscriber`，再以 `Typed` 包装；载荷反序列化失败会直接形成
//! `Deserialization` 来源的已分类失败。
//!
use crate::envelope::EventEnvelope;
use crate::error::{ReceiveError, SubscriberException};
use crate::handling::HandlingPolicy;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// 分发时传给订阅者的可变参数袋
pub type Args = HashMap<String, Value>;

/// 订阅者
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// 订阅者名称（注册去重、日志与工作状态使用）
    fn name(&self) -> &str;

    /// 处理策略，默认全部分类沿用宿主默认值
    fn handling_policy(&self) -> HandlingPolicy {
        HandlingPolicy::default()
    }

    /// 处理事件；长时间运行的订阅者应观察 `cancel`
    async fn receive(
        &self,
        event: &EventEnvelope,
        args: &mut Args,
        cancel: &CancellationToken,
    ) -> Result<(), ReceiveError>;
}

/// 强类型载荷的订阅者
#[async_trait]
pub trait TypedSubscriber: Send + Sync {
    type Payload: DeserializeOwned + Send;

    fn name(&self) -> &str;

    fn handling_policy(&self) -> HandlingPolicy {
        HandlingPolicy::default()
    }

    async fn handle(
        &self,
        event: &EventEnvelope,
        payload: Self::Payload,
        args: &mut Args,
        cancel: &CancellationToken,
    ) -> Result<(), ReceiveError>;
}

/// 将 `TypedSubscriber` 适配为 `Subscriber`
pub struct Typed<S>(pub S);

impl<S: TypedSubscriber> Typed<S> {
    pub fn payload_type() -> &'static str {
        std::any::type_name::<S::Payload>()
    }

    fn decode(&self, event: &EventEnvelope) -> Result<S::Payload, SubscriberException> {
        let decoded = match event.value() {
            Some(value) => value.deserialize::<S::Payload>(),
            None => serde_json::from_value(Value::Null),
        };
        decoded.map_err(|err| {
            SubscriberException::deserialization(event.id(), self.0.name(), Self::payload_type(), err)
        })
    }
}

#[async_trait]
impl<S: TypedSubscriber> Subscriber for Typed<S> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn handling_policy(&self) -> HandlingPolicy {
        self.0.handling_policy()
    }

    async fn receive(
        &self,
        event: &EventEnvelope,
        args: &mut Args,
        cancel: &CancellationToken,
    ) -> Result<(), ReceiveError> {
        let payload = self.decode(event)?;
        self.0.handle(event, payload, args, cancel).await
    }
}
