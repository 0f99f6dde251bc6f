//! 宿主配置
//!
use crate::error::{HostError, HostResult};
use serde::{Deserialize, Serialize};

/// 宿主配置
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// 同时进行的分发数量上限
    pub concurrency: usize,
    /// 内存事件来源的广播缓冲区容量
    pub source_capacity: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            source_capacity: 1024,
        }
    }
}

impl HostConfig {
    pub fn from_json(s: &str) -> HostResult<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// `concurrency` 为 0 表示不限制并发；广播缓冲区容量必须大于 0
    pub fn validate(&self) -> HostResult<()> {
        if self.source_capacity == 0 {
            return Err(HostError::InvalidConfig {
                reason: "source_capacity must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
