//! 事件订阅分发核心（eventsub-core）
//!
//! 负责把入站事件路由到唯一的订阅者，并以统一的方式处理其失败：
//! - 模板匹配（`matching`）：主题/类型按段通配，动作平铺通配，来源按 URL 匹配；
//! - 订阅注册表（`registry`）：启动时显式注册，只读查找，歧义即失败；
//! - 分发器（`dispatcher`）：匹配 → 调用 → 分类 → 执行处理结果；
//! - 失败处理（`handling`）：错误码分类、订阅者策略与处理结果执行器；
//! - 外部协作者（`tracking`）：工作状态跟踪与埋点协议。
//!
//! 本 crate 不绑定任何传输实现，也不负责重试调度；`Retry` 只表示「应当重投」，
//! 由调用方（传输适配层）决定如何重投。
//!
//! 典型用法：
//! 1. 为每个订阅者实现 `Subscriber`（或 `TypedSubscriber`）并给出处理策略；
//! 2. 启动时用静态表构建 `SubscriptionRegistry`；
//! 3. 以注册表与可选的协作者构建 `Dispatcher`；
//! 4. 传输层对每个事件调用 `Dispatcher::dispatch`，据返回值确认或重投消息。
//!
pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod handling;
pub mod matching;
pub mod registry;
pub mod specification;
pub mod subscriber;
pub mod tracking;

pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
pub use envelope::{EventEnvelope, EventValue};
pub use error::{
    CoreError, CoreResult, DispatchError, ErrorCategory, ErrorCode, ExceptionSource, ReceiveError,
    SubscriberError, SubscriberException,
};
pub use handling::{HandlingOutcome, HandlingPolicy, OutcomeExecutor};
pub use matching::{MatchCriteria, SourceTemplate};
pub use registry::{DispatchOutcome, SubscriberDescriptor, SubscriptionRegistry};
pub use subscriber::{Args, Subscriber, Typed, TypedSubscriber};
pub use tracking::{Instrumentation, WorkTracker};
