use super::{HandlingOutcome, HandlingPolicy};
use crate::error::{ErrorCategory, SubscriberError};

/// 分类结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub category: ErrorCategory,
    pub outcome: HandlingOutcome,
}

/// 将订阅者错误映射为分类与处理结果
///
/// 单次失败上的 `handling` 覆盖优先；否则按错误码得到分类，再经策略解析。
/// 只接受 `SubscriberError`：已分类的 `SubscriberException` 在类型上就无法再次进入这里。
pub fn classify(policy: &HandlingPolicy, error: &SubscriberError) -> Classification {
    let category = error.category();
    let outcome = error
        .handling()
        .unwrap_or_else(|| policy.resolve(category));
    Classification { category, outcome }
}
