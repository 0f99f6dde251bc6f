//! 分发器配置
//!
use crate::error::CoreResult;
use crate::handling::HandlingOutcome;
use serde::{Deserialize, Serialize};

/// 分发器配置
///
/// ```
/// use eventsub_core::config::DispatcherConfig;
/// use eventsub_core::handling::HandlingOutcome;
///
/// let config = DispatcherConfig::from_json(r#"{"not_subscribed":"complete_silent"}"#).unwrap();
/// assert_eq!(config.not_subscribed, HandlingOutcome::CompleteSilent);
/// assert_eq!(config.ambiguous_subscriber, HandlingOutcome::CriticalFailFast);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// 没有任何订阅者匹配时的处理结果
    pub not_subscribed: HandlingOutcome,
    /// 多个订阅者同时匹配时的处理结果
    pub ambiguous_subscriber: HandlingOutcome,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            not_subscribed: HandlingOutcome::HandleBySubscriber,
            ambiguous_subscriber: HandlingOutcome::CriticalFailFast,
        }
    }
}

impl DispatcherConfig {
    pub fn from_json(s: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
