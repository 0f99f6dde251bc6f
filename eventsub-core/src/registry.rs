//! 订阅注册表（SubscriptionRegistry）
//!
//! 启动时从静态表显式注册订阅描述，之后只读。查找按注册顺序进行，
//! 一旦出现第二个匹配的描述即判定为歧义并立即返回，不挑选「赢家」。
//!
use crate::envelope::EventEnvelope;
use crate::matching::MatchCriteria;
use crate::subscriber::{Subscriber, Typed, TypedSubscriber};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 订阅描述：订阅者及其匹配条件（多条条件之间为 OR）
#[derive(Clone)]
pub struct SubscriberDescriptor {
    criteria: Vec<MatchCriteria>,
    subscriber: Arc<dyn Subscriber>,
    payload_type: Option<&'static str>,
}

impl SubscriberDescriptor {
    pub fn new(subscriber: Arc<dyn Subscriber>, criteria: Vec<MatchCriteria>) -> Self {
        Self {
            criteria,
            subscriber,
            payload_type: None,
        }
    }

    /// 强类型订阅者，载荷类型记录在描述中
    pub fn typed<S>(subscriber: S, criteria: Vec<MatchCriteria>) -> Self
    where
        S: TypedSubscriber + 'static,
    {
        Self {
            criteria,
            subscriber: Arc::new(Typed(subscriber)),
            payload_type: Some(Typed::<S>::payload_type()),
        }
    }

    pub fn criteria(&self) -> &[MatchCriteria] {
        &self.criteria
    }

    pub fn subscriber(&self) -> &Arc<dyn Subscriber> {
        &self.subscriber
    }

    pub fn name(&self) -> &str {
        self.subscriber.name()
    }

    pub fn payload_type(&self) -> Option<&'static str> {
        self.payload_type
    }

    /// 任一条件匹配即视为匹配
    pub fn is_match(&self, event: &EventEnvelope) -> bool {
        self.criteria.iter().any(|c| c.is_match(event))
    }
}

impl fmt::Debug for SubscriberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberDescriptor")
            .field("subscriber", &self.name())
            .field("criteria", &self.criteria)
            .field("payload_type", &self.payload_type)
            .finish()
    }
}

/// 查找结果
#[derive(Debug)]
pub enum DispatchOutcome<'a> {
    NoMatch,
    AmbiguousMatch {
        first: &'a SubscriberDescriptor,
        second: &'a SubscriberDescriptor,
    },
    Matched(&'a SubscriberDescriptor),
}

/// 订阅注册表
///
/// 注册需要 `&mut self`，共享为 `Arc<SubscriptionRegistry>` 后即只读，并发查找无需加锁。
#[derive(Clone, Debug, Default)]
pub struct SubscriptionRegistry {
    descriptors: Vec<SubscriberDescriptor>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册订阅描述；同名订阅者重复注册时忽略并返回 `false`
    pub fn register(&mut self, descriptor: SubscriberDescriptor) -> bool {
        if self.contains(descriptor.name()) {
            debug!(
                subscriber = descriptor.name(),
                "subscriber already registered, ignoring"
            );
            return false;
        }
        debug!(
            subscriber = descriptor.name(),
            criteria = descriptor.criteria.len(),
            payload_type = descriptor.payload_type.unwrap_or("-"),
            "subscriber registered"
        );
        self.descriptors.push(descriptor);
        true
    }

    /// 批量注册，返回实际新增的数量
    pub fn register_all<I>(&mut self, descriptors: I) -> usize
    where
        I: IntoIterator<Item = SubscriberDescriptor>,
    {
        descriptors
            .into_iter()
            .map(|d| self.register(d))
            .filter(|added| *added)
            .count()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.iter().any(|d| d.name() == name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubscriberDescriptor> {
        self.descriptors.iter()
    }

    /// 查找匹配的订阅者，第二个匹配出现时立即返回歧义
    pub fn find_match(&self, event: &EventEnvelope) -> DispatchOutcome<'_> {
        let mut found: Option<&SubscriberDescriptor> = None;

        for descriptor in &self.descriptors {
            if !descriptor.is_match(event) {
                continue;
            }
            match found {
                None => found = Some(descriptor),
                Some(first) => {
                    return DispatchOutcome::AmbiguousMatch {
                        first,
                        second: descriptor,
                    };
                }
            }
        }

        match found {
            Some(descriptor) => DispatchOutcome::Matched(descriptor),
            None => DispatchOutcome::NoMatch,
        }
    }
}

impl FromIterator<SubscriberDescriptor> for SubscriptionRegistry {
    fn from_iter<I: IntoIterator<Item = SubscriberDescriptor>>(iter: I) -> Self {
        let mut registry = Self::new();
        registry.register_all(iter);
        registry
    }
}
