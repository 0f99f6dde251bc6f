//! 进程内订阅宿主（eventsub-host）
//!
//! 在分发核心之外提供一个可直接运行的进程内环境：
//! - `EventSource`：统一的事件来源协议，`InMemoryEventSource` 为基于广播的内存实现；
//! - `SubscriptionHost`：长驻任务，从事件来源拉取事件并以有界并发调用分发器；
//! - `InMemoryWorkTracker`：按事件记录处理状态的内存实现；
//! - `CountingInstrumentation`：按处理结果与分类计数的埋点实现。
//!
//! 宿主不做重试调度：分发返回可重试失败时只记录日志，重投由具体传输负责。
//!
pub mod config;
pub mod engine;
pub mod error;
pub mod instrumentation;
pub mod source;
pub mod source_inmemory;
pub mod tracker_inmemory;

pub use config::HostConfig;
pub use engine::{HostHandle, SubscriptionHost};
pub use error::{HostError, HostResult};
pub use instrumentation::CountingInstrumentation;
pub use source::EventSource;
pub use source_inmemory::InMemoryEventSource;
pub use tracker_inmemory::{InMemoryWorkTracker, WorkRecord, WorkState};
