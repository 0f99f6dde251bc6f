use super::HandlingOutcome;
use crate::error::ErrorCategory;
use serde::{Deserialize, Serialize};

/// 各分类的默认处理结果
///
/// 策略中某分类为 `HandleByHost` 时使用这里对应的字段。默认值本身为 `HandleByHost`
/// 时表示不做分类处理，原样交给宿主。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryDefaults {
    pub security: HandlingOutcome,
    pub transient: HandlingOutcome,
    pub not_found: HandlingOutcome,
    pub concurrency: HandlingOutcome,
    pub invalid_data: HandlingOutcome,
    pub data_consistency: HandlingOutcome,
    pub unhandled: HandlingOutcome,
}

impl Default for CategoryDefaults {
    fn default() -> Self {
        Self {
            security: HandlingOutcome::CompleteError,
            transient: HandlingOutcome::Retry,
            not_found: HandlingOutcome::CompleteWarning,
            concurrency: HandlingOutcome::Retry,
            invalid_data: HandlingOutcome::CompleteError,
            data_consistency: HandlingOutcome::CompleteError,
            unhandled: HandlingOutcome::HandleByHost,
        }
    }
}

impl CategoryDefaults {
    pub fn get(&self, category: ErrorCategory) -> HandlingOutcome {
        match category {
            ErrorCategory::Security => self.security,
            ErrorCategory::Transient => self.transient,
            ErrorCategory::NotFound => self.not_found,
            ErrorCategory::Concurrency => self.concurrency,
            ErrorCategory::InvalidData => self.invalid_data,
            ErrorCategory::DataConsistency => self.data_consistency,
            ErrorCategory::Unhandled => self.unhandled,
        }
    }
}

/// 订阅者的处理策略
///
/// 每个分类默认都是 `HandleByHost`（沿用 `defaults` 中的同名字段），订阅者只需覆盖关心的分类：
///
/// ```
/// use eventsub_core::error::ErrorCategory;
/// use eventsub_core::handling::{HandlingOutcome, HandlingPolicy};
///
/// let policy = HandlingPolicy::default().on(ErrorCategory::NotFound, HandlingOutcome::CompleteSilent);
/// assert_eq!(policy.resolve(ErrorCategory::NotFound), HandlingOutcome::CompleteSilent);
/// assert_eq!(policy.resolve(ErrorCategory::Transient), HandlingOutcome::Retry);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlingPolicy {
    pub security: HandlingOutcome,
    pub transient: HandlingOutcome,
    pub not_found: HandlingOutcome,
    pub concurrency: HandlingOutcome,
    pub invalid_data: HandlingOutcome,
    pub data_consistency: HandlingOutcome,
    pub unhandled: HandlingOutcome,
    pub defaults: CategoryDefaults,
}

impl Default for HandlingPolicy {
    fn default() -> Self {
        Self {
            security: HandlingOutcome::HandleByHost,
            transient: HandlingOutcome::HandleByHost,
            not_found: HandlingOutcome::HandleByHost,
            concurrency: HandlingOutcome::HandleByHost,
            invalid_data: HandlingOutcome::HandleByHost,
            data_consistency: HandlingOutcome::HandleByHost,
            unhandled: HandlingOutcome::HandleByHost,
            defaults: CategoryDefaults::default(),
        }
    }
}

impl HandlingPolicy {
    /// 覆盖某个分类的处理结果
    pub fn on(mut self, category: ErrorCategory, outcome: HandlingOutcome) -> Self {
        *self.slot_mut(category) = outcome;
        self
    }

    /// 替换整张默认值表
    pub fn with_defaults(mut self, defaults: CategoryDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// 策略中记录的原始值（可能为 `HandleByHost`）
    pub fn get(&self, category: ErrorCategory) -> HandlingOutcome {
        match category {
            ErrorCategory::Security => self.security,
            ErrorCategory::Transient => self.transient,
            ErrorCategory::NotFound => self.not_found,
            ErrorCategory::Concurrency => self.concurrency,
            ErrorCategory::InvalidData => self.invalid_data,
            ErrorCategory::DataConsistency => self.data_consistency,
            ErrorCategory::Unhandled => self.unhandled,
        }
    }

    /// 一步解析：`HandleByHost` 替换为该分类的默认值
    pub fn resolve(&self, category: ErrorCategory) -> HandlingOutcome {
        match self.get(category) {
            HandlingOutcome::HandleByHost => self.defaults.get(category),
            outcome => outcome,
        }
    }

    fn slot_mut(&mut self, category: ErrorCategory) -> &mut HandlingOutcome {
        match category {
            ErrorCategory::Security => &mut self.security,
            ErrorCategory::Transient => &mut self.transient,
            ErrorCategory::NotFound => &mut self.not_found,
            ErrorCategory::Concurrency => &mut self.concurrency,
            ErrorCategory::InvalidData => &mut self.invalid_data,
            ErrorCategory::DataConsistency => &mut self.data_consistency,
            ErrorCategory::Unhandled => &mut self.unhandled,
        }
    }
}
