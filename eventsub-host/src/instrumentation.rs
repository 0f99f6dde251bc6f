//! 计数埋点（CountingInstrumentation）
//!
//! 按处理结果与错误分类累计次数；成功以 `None` 结果上报。
//!
use dashmap::DashMap;
use eventsub_core::{ErrorCategory, HandlingOutcome, Instrumentation, SubscriberException};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Default)]
pub struct CountingInstrumentation {
    successes: Arc<AtomicU64>,
    by_outcome: Arc<DashMap<HandlingOutcome, u64>>,
    by_category: Arc<DashMap<ErrorCategory, u64>>,
}

impl CountingInstrumentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn successes(&self) -> u64 {
        self.successes.load(Ordering::Relaxed)
    }

    pub fn outcome(&self, outcome: HandlingOutcome) -> u64 {
        self.by_outcome.get(&outcome).map(|v| *v).unwrap_or(0)
    }

    pub fn category(&self, category: ErrorCategory) -> u64 {
        self.by_category.get(&category).map(|v| *v).unwrap_or(0)
    }

    /// 失败总数（不含成功）
    pub fn failures(&self) -> u64 {
        self.by_outcome.iter().map(|e| *e.value()).sum()
    }
}

impl Instrumentation for CountingInstrumentation {
    fn instrument(&self, outcome: Option<HandlingOutcome>, error: Option<&SubscriberException>) {
        match outcome {
            None => {
                self.successes.fetch_add(1, Ordering::Relaxed);
            }
            Some(outcome) => {
                *self.by_outcome.entry(outcome).or_insert(0) += 1;
            }
        }
        if let Some(error) = error {
            *self.by_category.entry(error.category()).or_insert(0) += 1;
        }
    }
}
