//! 内存版工作跟踪（InMemoryWorkTracker）
//!
//! 以事件 ID 为键记录最近一次处理状态、说明与次数，适合测试与本地开发。
//!
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use eventsub_core::WorkTracker;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkState {
    Completed,
    Failed,
    Indeterminate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkRecord {
    pub state: WorkState,
    pub message: Option<String>,
    /// 同一事件被记录的次数（重投时递增）
    pub attempts: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct InMemoryWorkTracker {
    records: Arc<DashMap<String, WorkRecord>>,
}

impl InMemoryWorkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, event_id: &str) -> Option<WorkState> {
        self.records.get(event_id).map(|r| r.state)
    }

    pub fn record(&self, event_id: &str) -> Option<WorkRecord> {
        self.records.get(event_id).map(|r| r.value().clone())
    }

    pub fn count(&self, state: WorkState) -> usize {
        self.records.iter().filter(|r| r.state == state).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 按事件 ID 排序的快照
    pub fn snapshot(&self) -> Vec<(String, WorkRecord)> {
        let mut all: Vec<(String, WorkRecord)> = self
            .records
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    fn upsert(&self, event_id: &str, state: WorkState, message: Option<&str>) {
        let now = Utc::now();
        self.records
            .entry(event_id.to_string())
            .and_modify(|r| {
                r.state = state;
                r.message = message.map(str::to_string);
                r.attempts += 1;
                r.updated_at = now;
            })
            .or_insert_with(|| WorkRecord {
                state,
                message: message.map(str::to_string),
                attempts: 1,
                updated_at: now,
            });
    }
}

#[async_trait]
impl WorkTracker for InMemoryWorkTracker {
    async fn complete(&self, event_id: &str) -> anyhow::Result<()> {
        self.upsert(event_id, WorkState::Completed, None);
        Ok(())
    }

    async fn fail(&self, event_id: &str, message: &str) -> anyhow::Result<()> {
        self.upsert(event_id, WorkState::Failed, Some(message));
        Ok(())
    }

    async fn indeterminate(&self, event_id: &str, message: &str) -> anyhow::Result<()> {
        self.upsert(event_id, WorkState::Indeterminate, Some(message));
        Ok(())
    }
}
